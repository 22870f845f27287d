use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Session;

// ── Sessions ──

pub fn get_session(conn: &Connection, session_id: &str) -> anyhow::Result<Option<Session>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM sessions WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )
        .optional()?;

    match data {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Loads a session, or a fresh one if the id has never been seen.
pub fn load_session(conn: &Connection, session_id: &str) -> anyhow::Result<Session> {
    Ok(get_session(conn, session_id)?.unwrap_or_default())
}

pub fn save_session(conn: &Connection, session_id: &str, session: &Session) -> anyhow::Result<()> {
    let data = serde_json::to_string(session)?;
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO sessions (session_id, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(session_id) DO UPDATE SET
           data = excluded.data,
           updated_at = excluded.updated_at",
        params![session_id, data, now],
    )?;
    Ok(())
}

pub fn count_sessions(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
    Ok(count)
}
