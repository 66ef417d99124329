//! Database schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- One row per received chat message
        CREATE TABLE IF NOT EXISTS message_log (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            message_text TEXT NOT NULL,
            whatsapp_message_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_message_log_user ON message_log(user_id);

        -- One row per downloaded attachment, owned by a message_log row
        CREATE TABLE IF NOT EXISTS media (
            id TEXT PRIMARY KEY,
            message_log_id TEXT NOT NULL REFERENCES message_log(id),
            whatsapp_message_id TEXT,
            user_id TEXT,
            media_id TEXT NOT NULL,
            media_type TEXT NOT NULL,
            mime_type TEXT,
            storage_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_media_message ON media(message_log_id);

        PRAGMA user_version = 1;
        ",
    )?;

    Ok(())
}
