//! Media repository for downloaded attachments

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::{Error, Result};

/// One downloaded attachment, owned by a message log row
#[derive(Debug, Clone)]
pub struct Media {
    pub id: String,
    /// Owning message log row
    pub message_log_id: String,
    pub whatsapp_message_id: Option<String>,
    pub user_id: Option<String>,
    /// Provider media identifier the bytes were resolved from
    pub media_id: String,
    /// Media type tag (e.g. "image")
    pub media_type: String,
    /// MIME type observed on the download response
    pub mime_type: Option<String>,
    /// Object storage key the bytes were uploaded under
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new media row
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub message_log_id: String,
    pub whatsapp_message_id: Option<String>,
    pub user_id: Option<String>,
    pub media_id: String,
    pub media_type: String,
    pub mime_type: Option<String>,
    pub storage_key: String,
}

/// Media repository
#[derive(Clone)]
pub struct MediaRepo {
    pool: DbPool,
}

impl MediaRepo {
    /// Create a new media repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert one media row and return it with generated fields
    ///
    /// The referenced message log row must already exist.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn insert(&self, new: NewMedia) -> Result<Media> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            "INSERT INTO media (id, message_log_id, whatsapp_message_id, user_id, media_id,
                                media_type, mime_type, storage_key, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                &id,
                &new.message_log_id,
                &new.whatsapp_message_id,
                &new.user_id,
                &new.media_id,
                &new.media_type,
                &new.mime_type,
                &new.storage_key,
                &now_str,
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(Media {
            id,
            message_log_id: new.message_log_id,
            whatsapp_message_id: new.whatsapp_message_id,
            user_id: new.user_id,
            media_id: new.media_id,
            media_type: new.media_type,
            mime_type: new.mime_type,
            storage_key: new.storage_key,
            created_at: now,
        })
    }

    /// List media rows owned by a message log row
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_for_message(&self, message_log_id: &str) -> Result<Vec<Media>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, message_log_id, whatsapp_message_id, user_id, media_id,
                        media_type, mime_type, storage_key, created_at
                 FROM media WHERE message_log_id = ?1 ORDER BY created_at",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let rows = stmt
            .query_map([message_log_id], |row| {
                Ok(Media {
                    id: row.get(0)?,
                    message_log_id: row.get(1)?,
                    whatsapp_message_id: row.get(2)?,
                    user_id: row.get(3)?,
                    media_id: row.get(4)?,
                    media_type: row.get(5)?,
                    mime_type: row.get(6)?,
                    storage_key: row.get(7)?,
                    created_at: parse_datetime(&row.get::<_, String>(8)?),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(rows)
    }

    /// Count media rows
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, MessageLogRepo};

    fn setup() -> (MessageLogRepo, MediaRepo) {
        let pool = init_memory().unwrap();
        (MessageLogRepo::new(pool.clone()), MediaRepo::new(pool))
    }

    fn new_media(message_log_id: &str) -> NewMedia {
        NewMedia {
            message_log_id: message_log_id.to_string(),
            whatsapp_message_id: Some("wamid.abc".to_string()),
            user_id: Some("15551234567".to_string()),
            media_id: "media-1".to_string(),
            media_type: "image".to_string(),
            mime_type: Some("image/jpeg".to_string()),
            storage_key: "images/15551234567/wamid.abc.jpg".to_string(),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let (logs, media) = setup();

        let log = logs
            .insert(Some("15551234567"), "photo", Some("wamid.abc"))
            .unwrap();

        let row = media.insert(new_media(&log.id)).unwrap();
        assert_eq!(row.message_log_id, log.id);
        assert_eq!(row.storage_key, "images/15551234567/wamid.abc.jpg");

        let listed = media.list_for_message(&log.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, row.id);
    }

    #[test]
    fn test_insert_requires_owning_message() {
        let (_, media) = setup();

        // No message_log row with this id exists
        let err = media.insert(new_media("missing")).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(media.count().unwrap(), 0);
    }
}
