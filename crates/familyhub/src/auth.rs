//! Sessions, access checks and route decisions.
//!
//! A session token is a random UUID handed to the client once; only its
//! BLAKE3 hash is stored. [`AccessGate`] turns a token into an [`Identity`]
//! and checks it against a [`Requirement`]. Not being logged in
//! ([`Error::Unauthenticated`]) and being logged in without permission
//! ([`Error::Forbidden`]) are always reported separately.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::hub::FamilyHub;
use crate::model::Member;
use crate::storage::SessionRecord;

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token; shown to the client once.
    pub token: String,
    /// Login identity.
    pub user_id: String,
    /// When the token stops working.
    pub expires_at: DateTime<Utc>,
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No valid session.
    Anonymous {
        /// Why there is no session.
        reason: String,
    },
    /// Logged in, but not on any family's member list.
    Unlisted {
        /// Login identity.
        user_id: String,
    },
    /// A family member.
    Member(Member),
}

impl Identity {
    /// The member, if this is one.
    #[must_use]
    pub fn member(&self) -> Option<&Member> {
        match self {
            Self::Member(member) => Some(member),
            _ => None,
        }
    }

    /// Whether a session exists at all.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !matches!(self, Self::Anonymous { .. })
    }
}

/// What an operation demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any family member.
    AnyMember,
    /// An admin or editor.
    Editor,
    /// An admin.
    Admin,
    /// The mother herself, or an admin previewing her display.
    MotherDisplay,
}

impl Requirement {
    /// Whether `member` satisfies the requirement.
    #[must_use]
    pub fn permits(self, member: &Member) -> bool {
        match self {
            Self::AnyMember => true,
            Self::Editor => member.role.can_edit(),
            Self::Admin => member.role.is_admin(),
            Self::MotherDisplay => member.is_mother || member.role.is_admin(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyMember => write!(f, "family membership"),
            Self::Editor => write!(f, "the editor or admin role"),
            Self::Admin => write!(f, "the admin role"),
            Self::MotherDisplay => write!(f, "the mom display account"),
        }
    }
}

/// Check `member` against `requirement`.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] if the requirement is not met.
pub fn require(member: &Member, requirement: Requirement) -> Result<()> {
    if requirement.permits(member) {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "{} ({}) lacks {}",
            member.first_name, member.role, requirement
        )))
    }
}

fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Issues sessions and checks access.
#[derive(Debug, Clone)]
pub struct AccessGate {
    hub: FamilyHub,
}

impl AccessGate {
    /// Create a gate over `hub`.
    #[must_use]
    pub fn new(hub: FamilyHub) -> Self {
        Self { hub }
    }

    /// Start a session for `user_id`.
    ///
    /// Users need not be family members to log in; what they may do is
    /// decided per operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the user id is blank or the write fails.
    pub async fn login(&self, user_id: &str) -> Result<Session> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::invalid_input("user id must not be empty"));
        }

        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let record = SessionRecord {
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + self.hub.config().session_ttl(),
        };
        let token_hash = hash_token(&token);
        let pruned = self
            .hub
            .write("insert_session", |s| {
                let pruned = s.prune_sessions(now)?;
                s.insert_session(&token_hash, &record)?;
                Ok(pruned)
            })
            .await?;
        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }

        info!("Session started for {}", user_id);
        Ok(Session {
            token,
            user_id: record.user_id,
            expires_at: record.expires_at,
        })
    }

    /// End a session. Returns `false` if the token was not known.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn logout(&self, token: &str) -> Result<bool> {
        let token_hash = hash_token(token);
        let removed = self
            .hub
            .write("delete_session", |s| s.delete_session(&token_hash))
            .await?;
        debug!("Logout removed session: {}", removed);
        Ok(removed)
    }

    /// Resolve a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error only if storage fails; a missing, unknown or expired
    /// token yields [`Identity::Anonymous`].
    pub fn identify(&self, token: Option<&str>) -> Result<Identity> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(Identity::Anonymous {
                reason: "no session token".to_string(),
            });
        };

        let Some(session) = self.hub.read(|s| s.session(&hash_token(token)))? else {
            return Ok(Identity::Anonymous {
                reason: "unknown session token".to_string(),
            });
        };
        if session.expires_at <= Utc::now() {
            return Ok(Identity::Anonymous {
                reason: format!("session expired at {}", session.expires_at),
            });
        }

        match self.hub.read(|s| s.member_by_user(&session.user_id))? {
            Some(member) => Ok(Identity::Member(member)),
            None => Ok(Identity::Unlisted {
                user_id: session.user_id,
            }),
        }
    }

    /// Resolve a token and check it against `requirement`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without a valid session,
    /// [`Error::Forbidden`] for a non-member or a member lacking permission.
    pub fn authorize(&self, token: Option<&str>, requirement: Requirement) -> Result<Member> {
        match self.identify(token)? {
            Identity::Anonymous { reason } => Err(Error::unauthenticated(reason)),
            Identity::Unlisted { user_id } => Err(Error::forbidden(format!(
                "{user_id} is not on any family's member list"
            ))),
            Identity::Member(member) => {
                require(&member, requirement)?;
                Ok(member)
            }
        }
    }

    /// Decide how a request for `path` with `token` is handled.
    ///
    /// # Errors
    ///
    /// Returns an error if the session lookup fails.
    pub fn route(&self, token: Option<&str>, path: &str) -> Result<RouteDecision> {
        let identity = self.identify(token)?;
        let decision = decide_route(path, &identity);
        debug!("Route {} -> {}", path, decision);
        Ok(decision)
    }
}

/// Why a route was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Not logged in.
    Unauthenticated(String),
    /// Logged in but not permitted.
    Forbidden(String),
}

impl Denial {
    /// The equivalent error.
    #[must_use]
    pub fn into_error(self) -> Error {
        match self {
            Self::Unauthenticated(reason) => Error::unauthenticated(reason),
            Self::Forbidden(reason) => Error::forbidden(reason),
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated(reason) => write!(f, "not logged in: {reason}"),
            Self::Forbidden(reason) => write!(f, "forbidden: {reason}"),
        }
    }
}

/// What to do with a request for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve it.
    Proceed,
    /// Send the client elsewhere.
    Redirect {
        /// Target path.
        to: &'static str,
        /// Set when the redirect is a refusal.
        denial: Option<Denial>,
    },
    /// Show a refusal in place.
    Deny(Denial),
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => f.write_str("proceed"),
            Self::Redirect { to, denial: None } => write!(f, "redirect to {to}"),
            Self::Redirect {
                to,
                denial: Some(denial),
            } => write!(f, "redirect to {to} ({denial})"),
            Self::Deny(denial) => write!(f, "deny ({denial})"),
        }
    }
}

/// Login page.
pub const LOGIN_PATH: &str = "/auth/login";
/// Caregiver dashboard.
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Mom display.
pub const MOM_PATH: &str = "/mom";

fn path_requirement(path: &str) -> Requirement {
    if path == "/dashboard/admin" || path.starts_with("/dashboard/admin/") {
        Requirement::Admin
    } else {
        Requirement::AnyMember
    }
}

/// Decide how to handle a request for `path` from `identity`.
#[must_use]
pub fn decide_route(path: &str, identity: &Identity) -> RouteDecision {
    if path == "/auth" || path.starts_with("/auth/") {
        if identity.is_logged_in() && path.starts_with(LOGIN_PATH) {
            return RouteDecision::Redirect {
                to: DASHBOARD_PATH,
                denial: None,
            };
        }
        return RouteDecision::Proceed;
    }

    match identity {
        Identity::Anonymous { reason } => RouteDecision::Redirect {
            to: LOGIN_PATH,
            denial: Some(Denial::Unauthenticated(reason.clone())),
        },
        Identity::Unlisted { user_id } => {
            let denial = Denial::Forbidden(format!("{user_id} is not on the family list"));
            if path == DASHBOARD_PATH {
                RouteDecision::Deny(denial)
            } else {
                RouteDecision::Redirect {
                    to: LOGIN_PATH,
                    denial: Some(denial),
                }
            }
        }
        Identity::Member(member) => {
            if path == DASHBOARD_PATH && member.is_mother {
                return RouteDecision::Redirect {
                    to: MOM_PATH,
                    denial: None,
                };
            }
            match require(member, path_requirement(path)) {
                Ok(()) => RouteDecision::Proceed,
                Err(e) => RouteDecision::Redirect {
                    to: DASHBOARD_PATH,
                    denial: Some(Denial::Forbidden(e.to_string())),
                },
            }
        }
    }
}
