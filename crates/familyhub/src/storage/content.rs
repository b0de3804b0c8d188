//! Tutorials and gallery photos.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_timestamp, parse_text, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::model::{ContentType, FamilyId, NewPhoto, NewTutorial, Photo, Tutorial};

const TUTORIAL_COLUMNS: &str =
    "id, family_id, title, content_type, video_url, steps, is_active, created_at";

impl Storage {
    /// Add a tutorial.
    ///
    /// Video tutorials need a video link; image tutorials need at least one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the tutorial is incomplete, the family does not exist,
    /// or the database operation fails.
    pub fn add_tutorial(&self, tutorial: &NewTutorial) -> Result<Tutorial> {
        let title = tutorial.title.trim();
        if title.is_empty() {
            return Err(Error::invalid_input("tutorial title must not be empty"));
        }
        match tutorial.content_type {
            ContentType::Video if tutorial.video_url.as_deref().map_or(true, str::is_empty) => {
                return Err(Error::invalid_input("video tutorials need a video url"));
            }
            ContentType::Images if tutorial.steps.is_empty() => {
                return Err(Error::invalid_input("image tutorials need at least one step"));
            }
            _ => {}
        }
        if self.family(tutorial.family_id)?.is_none() {
            return Err(Error::not_found("family", tutorial.family_id));
        }

        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO tutorials (family_id, title, content_type, video_url, steps, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                tutorial.family_id,
                title,
                tutorial.content_type.as_str(),
                tutorial.video_url,
                serde_json::to_string(&tutorial.steps)?,
                format_timestamp(&created_at),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        debug!("Added tutorial {} for family {}", id, tutorial.family_id);

        Ok(Tutorial {
            id,
            family_id: tutorial.family_id,
            title: title.to_string(),
            content_type: tutorial.content_type,
            video_url: tutorial.video_url.clone(),
            steps: tutorial.steps.clone(),
            is_active: true,
            created_at,
        })
    }

    /// Get a tutorial by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn tutorial(&self, id: i64) -> Result<Option<Tutorial>> {
        let tutorial = self
            .conn()
            .query_row(
                &format!("SELECT {TUTORIAL_COLUMNS} FROM tutorials WHERE id = ?1"),
                [id],
                row_to_tutorial,
            )
            .optional()?;
        Ok(tutorial)
    }

    /// List a family's tutorials, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn tutorials(&self, family_id: FamilyId) -> Result<Vec<Tutorial>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TUTORIAL_COLUMNS} FROM tutorials WHERE family_id = ?1 ORDER BY id ASC"
        ))?;
        let tutorials = stmt
            .query_map([family_id], row_to_tutorial)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tutorials)
    }

    /// Activate or deactivate a tutorial.
    ///
    /// # Errors
    ///
    /// Returns an error if the tutorial does not exist or the database operation fails.
    pub fn set_tutorial_active(&self, id: i64, active: bool) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE tutorials SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("tutorial", id));
        }
        Ok(())
    }

    /// Add a gallery photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the url is blank, the family does not exist, or the
    /// database operation fails.
    pub fn add_photo(&self, photo: &NewPhoto) -> Result<Photo> {
        if photo.url.trim().is_empty() {
            return Err(Error::invalid_input("photo url must not be empty"));
        }
        if self.family(photo.family_id)?.is_none() {
            return Err(Error::not_found("family", photo.family_id));
        }
        self.conn().execute(
            "INSERT INTO photos (family_id, url, caption, display_order, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![photo.family_id, photo.url, photo.caption, photo.display_order],
        )?;
        Ok(Photo {
            id: self.conn().last_insert_rowid(),
            family_id: photo.family_id,
            url: photo.url.clone(),
            caption: photo.caption.clone(),
            display_order: photo.display_order,
            is_active: true,
        })
    }

    /// Active photos of a family in rotation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn active_photos(&self, family_id: FamilyId) -> Result<Vec<Photo>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, family_id, url, caption, display_order, is_active FROM photos
             WHERE family_id = ?1 AND is_active = 1
             ORDER BY display_order ASC, id ASC",
        )?;
        let photos = stmt
            .query_map([family_id], |row| {
                Ok(Photo {
                    id: row.get(0)?,
                    family_id: row.get(1)?,
                    url: row.get(2)?,
                    caption: row.get(3)?,
                    display_order: row.get(4)?,
                    is_active: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(photos)
    }

    /// Activate or deactivate a photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo does not exist or the database operation fails.
    pub fn set_photo_active(&self, id: i64, active: bool) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE photos SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("photo", id));
        }
        Ok(())
    }
}

fn row_to_tutorial(row: &Row) -> rusqlite::Result<Tutorial> {
    let content_type: String = row.get(3)?;
    let steps: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    Ok(Tutorial {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        content_type: parse_text(3, &content_type)?,
        video_url: row.get(4)?,
        steps: serde_json::from_str(&steps)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        is_active: row.get(6)?,
        created_at: parse_timestamp(7, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TutorialStep;
    use crate::storage::test_support::{family, storage};

    fn image_tutorial(family_id: FamilyId) -> NewTutorial {
        NewTutorial {
            family_id,
            title: "Answering a video call".to_string(),
            content_type: ContentType::Images,
            video_url: None,
            steps: vec![
                TutorialStep {
                    text: "Wait for the ring".to_string(),
                    image_url: None,
                },
                TutorialStep {
                    text: "Press the green button".to_string(),
                    image_url: Some("https://example.com/green.png".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_add_and_get_tutorial_with_steps() {
        let storage = storage();
        let family_id = family(&storage);

        let added = storage.add_tutorial(&image_tutorial(family_id)).unwrap();
        let loaded = storage.tutorial(added.id).unwrap().unwrap();
        assert_eq!(loaded, added);
        assert_eq!(loaded.steps.len(), 2);
        assert_eq!(storage.tutorials(family_id).unwrap(), vec![added]);
    }

    #[test]
    fn test_incomplete_tutorials_rejected() {
        let storage = storage();
        let family_id = family(&storage);

        let mut video = image_tutorial(family_id);
        video.content_type = ContentType::Video;
        video.video_url = None;
        assert!(storage.add_tutorial(&video).is_err());

        let mut images = image_tutorial(family_id);
        images.steps.clear();
        assert!(storage.add_tutorial(&images).is_err());
    }

    #[test]
    fn test_deactivate_tutorial() {
        let storage = storage();
        let family_id = family(&storage);
        let added = storage.add_tutorial(&image_tutorial(family_id)).unwrap();

        storage.set_tutorial_active(added.id, false).unwrap();
        assert!(!storage.tutorial(added.id).unwrap().unwrap().is_active);
        assert!(storage.set_tutorial_active(999, true).unwrap_err().is_not_found());
    }

    #[test]
    fn test_active_photos_in_display_order() {
        let storage = storage();
        let family_id = family(&storage);
        let add = |url: &str, order: i64| {
            storage
                .add_photo(&NewPhoto {
                    family_id,
                    url: url.to_string(),
                    caption: None,
                    display_order: order,
                })
                .unwrap()
        };
        let late = add("c.jpg", 5);
        let early = add("a.jpg", 1);
        let hidden = add("b.jpg", 2);
        storage.set_photo_active(hidden.id, false).unwrap();

        let photos = storage.active_photos(family_id).unwrap();
        assert_eq!(photos, vec![early, late]);
    }
}
