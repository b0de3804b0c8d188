//! Families, members and login sessions.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_timestamp, parse_text, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::model::{Family, FamilyId, Member, MemberId, NewMember, Role};

const MEMBER_COLUMNS: &str = "id, family_id, user_id, first_name, role, is_mother, phone";

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Login identity.
    pub user_id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Storage {
    /// Create a family.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the database operation fails.
    pub fn create_family(&self, name: &str) -> Result<Family> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("family name must not be empty"));
        }
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO families (name, created_at) VALUES (?1, ?2)",
            params![name, format_timestamp(&created_at)],
        )?;
        let id = self.conn().last_insert_rowid();
        debug!("Created family {} ({})", id, name);
        Ok(Family {
            id,
            name: name.to_string(),
            created_at,
        })
    }

    /// Get a family by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn family(&self, id: FamilyId) -> Result<Option<Family>> {
        let family = self
            .conn()
            .query_row(
                "SELECT id, name, created_at FROM families WHERE id = ?1",
                [id],
                |row| {
                    let created_at: String = row.get(2)?;
                    Ok(Family {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: parse_timestamp(2, &created_at)?,
                    })
                },
            )
            .optional()?;
        Ok(family)
    }

    /// Add a member to a family.
    ///
    /// # Errors
    ///
    /// Returns an error if the family does not exist, the user id is already
    /// taken, or the database operation fails.
    pub fn insert_member(&self, member: &NewMember) -> Result<Member> {
        if self.family(member.family_id)?.is_none() {
            return Err(Error::not_found("family", member.family_id));
        }
        if member.user_id.trim().is_empty() {
            return Err(Error::invalid_input("user id must not be empty"));
        }
        if self.member_by_user(&member.user_id)?.is_some() {
            return Err(Error::invalid_input(format!(
                "user {} already belongs to a family",
                member.user_id
            )));
        }

        self.conn().execute(
            "INSERT INTO members (family_id, user_id, first_name, role, is_mother, phone)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                member.family_id,
                member.user_id,
                member.first_name,
                member.role.as_str(),
                member.is_mother,
                member.phone,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        debug!("Added member {} to family {}", id, member.family_id);
        Ok(Member {
            id,
            family_id: member.family_id,
            user_id: member.user_id.clone(),
            first_name: member.first_name.clone(),
            role: member.role,
            is_mother: member.is_mother,
            phone: member.phone.clone(),
        })
    }

    /// Get a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn member(&self, id: MemberId) -> Result<Option<Member>> {
        let member = self
            .conn()
            .query_row(
                &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1"),
                [id],
                row_to_member,
            )
            .optional()?;
        Ok(member)
    }

    /// Get the member a login identity belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn member_by_user(&self, user_id: &str) -> Result<Option<Member>> {
        let member = self
            .conn()
            .query_row(
                &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE user_id = ?1"),
                [user_id],
                row_to_member,
            )
            .optional()?;
        Ok(member)
    }

    /// List a family's members, the mother first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn members(&self, family_id: FamilyId) -> Result<Vec<Member>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE family_id = ?1
             ORDER BY is_mother DESC, id ASC"
        ))?;
        let members = stmt
            .query_map([family_id], row_to_member)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Change a member's role.
    ///
    /// # Errors
    ///
    /// Returns an error if the member does not exist or the database operation fails.
    pub fn set_member_role(&self, id: MemberId, role: Role) -> Result<Member> {
        let affected = self.conn().execute(
            "UPDATE members SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("member", id));
        }
        self.member(id)?.ok_or_else(|| Error::not_found("member", id))
    }

    /// Store a session under the hash of its token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_session(&self, token_hash: &str, session: &SessionRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token_hash,
                session.user_id,
                format_timestamp(&session.created_at),
                format_timestamp(&session.expires_at),
            ],
        )?;
        Ok(())
    }

    /// Look up a session by token hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn session(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        let session = self
            .conn()
            .query_row(
                "SELECT user_id, created_at, expires_at FROM sessions WHERE token_hash = ?1",
                [token_hash],
                |row| {
                    let created_at: String = row.get(1)?;
                    let expires_at: String = row.get(2)?;
                    Ok(SessionRecord {
                        user_id: row.get(0)?,
                        created_at: parse_timestamp(1, &created_at)?,
                        expires_at: parse_timestamp(2, &expires_at)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    /// Delete a session. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE token_hash = ?1", [token_hash])?;
        Ok(affected > 0)
    }

    /// Remove sessions that expired before `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            [format_timestamp(&now)],
        )?;
        Ok(affected)
    }
}

fn row_to_member(row: &Row) -> rusqlite::Result<Member> {
    let role: String = row.get(4)?;
    Ok(Member {
        id: row.get(0)?,
        family_id: row.get(1)?,
        user_id: row.get(2)?,
        first_name: row.get(3)?,
        role: parse_text(4, &role)?,
        is_mother: row.get(5)?,
        phone: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{family, member, storage};

    #[test]
    fn test_create_family_rejects_blank_name() {
        let storage = storage();
        assert!(storage.create_family("  ").is_err());
    }

    #[test]
    fn test_insert_and_get_member() {
        let storage = storage();
        let family_id = family(&storage);
        let added = member(&storage, family_id, "dana@example.com", Role::Editor);

        let by_id = storage.member(added.id).unwrap().unwrap();
        let by_user = storage.member_by_user("dana@example.com").unwrap().unwrap();
        assert_eq!(by_id, added);
        assert_eq!(by_user, added);
        assert_eq!(added.first_name, "dana");
    }

    #[test]
    fn test_insert_member_unknown_family() {
        let storage = storage();
        let err = storage
            .insert_member(&NewMember {
                family_id: 99,
                user_id: "x@example.com".to_string(),
                first_name: "X".to_string(),
                role: Role::Viewer,
                is_mother: false,
                phone: None,
            })
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let storage = storage();
        let family_id = family(&storage);
        member(&storage, family_id, "dana@example.com", Role::Editor);

        let err = storage
            .insert_member(&NewMember {
                family_id,
                user_id: "dana@example.com".to_string(),
                first_name: "Dana".to_string(),
                role: Role::Viewer,
                is_mother: false,
                phone: None,
            })
            .unwrap_err();
        assert!(err.to_string().contains("already belongs"));
    }

    #[test]
    fn test_members_lists_mother_first() {
        let storage = storage();
        let family_id = family(&storage);
        member(&storage, family_id, "son@example.com", Role::Admin);
        let mom = storage
            .insert_member(&NewMember {
                family_id,
                user_id: "mom@example.com".to_string(),
                first_name: "Rivka".to_string(),
                role: Role::Viewer,
                is_mother: true,
                phone: Some("050-0000000".to_string()),
            })
            .unwrap();

        let members = storage.members(family_id).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0], mom);
    }

    #[test]
    fn test_set_member_role() {
        let storage = storage();
        let family_id = family(&storage);
        let viewer = member(&storage, family_id, "v@example.com", Role::Viewer);

        let updated = storage.set_member_role(viewer.id, Role::Editor).unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert!(storage.set_member_role(999, Role::Admin).unwrap_err().is_not_found());
    }

    #[test]
    fn test_session_lifecycle() {
        let storage = storage();
        let now = Utc::now();
        let record = SessionRecord {
            user_id: "dana@example.com".to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };

        storage.insert_session("hash-a", &record).unwrap();
        assert_eq!(storage.session("hash-a").unwrap(), Some(record));
        assert!(storage.session("hash-b").unwrap().is_none());

        assert!(storage.delete_session("hash-a").unwrap());
        assert!(!storage.delete_session("hash-a").unwrap());
    }

    #[test]
    fn test_prune_sessions() {
        let storage = storage();
        let now = Utc::now();
        let expired = SessionRecord {
            user_id: "old@example.com".to_string(),
            created_at: now - chrono::Duration::days(2),
            expires_at: now - chrono::Duration::days(1),
        };
        let live = SessionRecord {
            user_id: "new@example.com".to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::days(1),
        };
        storage.insert_session("old", &expired).unwrap();
        storage.insert_session("new", &live).unwrap();

        assert_eq!(storage.prune_sessions(now).unwrap(), 1);
        assert!(storage.session("old").unwrap().is_none());
        assert!(storage.session("new").unwrap().is_some());
    }
}
