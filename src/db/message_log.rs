//! Message log repository for CRUD operations

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::{Error, Result};

/// One received chat message
#[derive(Debug, Clone)]
pub struct MessageLog {
    pub id: String,
    /// Sender identifier (phone number); absent when the envelope omits it
    pub user_id: Option<String>,
    pub message_text: String,
    /// Provider-assigned message identifier
    pub whatsapp_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Message log repository
#[derive(Clone)]
pub struct MessageLogRepo {
    pool: DbPool,
}

impl MessageLogRepo {
    /// Create a new message log repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert one message row and return it with generated fields
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn insert(
        &self,
        user_id: Option<&str>,
        message_text: &str,
        whatsapp_message_id: Option<&str>,
    ) -> Result<MessageLog> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            "INSERT INTO message_log (id, user_id, message_text, whatsapp_message_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![&id, user_id, message_text, whatsapp_message_id, &now_str],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(MessageLog {
            id,
            user_id: user_id.map(String::from),
            message_text: message_text.to_string(),
            whatsapp_message_id: whatsapp_message_id.map(String::from),
            created_at: now,
        })
    }

    /// Fetch a message by id
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, id: &str) -> Result<Option<MessageLog>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT id, user_id, message_text, whatsapp_message_id, created_at
                 FROM message_log WHERE id = ?1",
                [id],
                |row| {
                    Ok(MessageLog {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        message_text: row.get(2)?,
                        whatsapp_message_id: row.get(3)?,
                        created_at: parse_datetime(&row.get::<_, String>(4)?),
                    })
                },
            )
            .ok();

        Ok(row)
    }

    /// List all message rows, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list_all(&self) -> Result<Vec<MessageLog>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, message_text, whatsapp_message_id, created_at
                 FROM message_log ORDER BY created_at",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MessageLog {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message_text: row.get(2)?,
                    whatsapp_message_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(rows)
    }

    /// Count message rows
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
            .query_row("SELECT COUNT(*) FROM message_log", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
