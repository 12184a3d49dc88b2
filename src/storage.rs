use crate::api::models::Chat;
use directories::ProjectDirs;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cache directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cached chat is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Last chat list seen from the server, so the sidebar has something to show
/// before the first request completes.
#[derive(Debug, Clone)]
pub struct ChatCache {
    path: PathBuf,
}

impl ChatCache {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache in the data dir, one file per server and user so that logging
    /// in as someone else never shows the previous user's chats.
    pub fn for_identity(server_url: &str, phone: &str) -> Option<Self> {
        let proj = ProjectDirs::from("com", "example", "ChatViewGTK")?;
        Some(Self::at(proj.data_dir().join(Self::file_name(server_url, phone))))
    }

    fn file_name(server_url: &str, phone: &str) -> String {
        let mut name = String::from("cache-");
        escape_into(&mut name, server_url.trim().trim_end_matches('/'));
        name.push('-');
        escape_into(&mut name, phone.trim());
        name.push_str(".sqlite");
        name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_conn(&self) -> Result<Connection, CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Connection::open(&self.path)?)
    }

    pub fn init(&self) -> Result<(), CacheError> {
        let conn = self.open_conn()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY,
                position INTEGER NOT NULL,
                contact_name TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                raw_json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Replace the cached list with `chats`, remembering their order.
    pub fn replace_chats(&self, chats: &[Chat]) -> Result<(), CacheError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        let mut conn = self.open_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chats", [])?;
        for (position, chat) in chats.iter().enumerate() {
            let raw = serde_json::to_string(chat)?;
            tx.execute(
                r#"
                INSERT INTO chats (id, position, contact_name, updated_at, raw_json)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    position=excluded.position,
                    contact_name=excluded.contact_name,
                    updated_at=excluded.updated_at,
                    raw_json=excluded.raw_json
                "#,
                params![chat.id, position as i64, chat.contact_name, now, raw],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn chats(&self, limit: Option<usize>) -> Result<Vec<Chat>, CacheError> {
        let conn = self.open_conn()?;
        let mut stmt = conn.prepare("SELECT raw_json FROM chats ORDER BY position ASC LIMIT ?1")?;
        let lim = limit.unwrap_or(500) as i64;
        let rows = stmt.query_map(params![lim], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(serde_json::from_str(&raw?)?);
        }
        Ok(out)
    }
}

/// Keep ASCII alphanumerics, write every other byte as `_xx`.
fn escape_into(out: &mut String, raw: &str) {
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() {
            out.push(b as char);
        } else {
            out.push_str(&format!("_{b:02x}"));
        }
    }
}
