//! SQLite session store

use super::{NewSessionRecord, SessionStore, StoredSession};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const SELECT_COLUMNS: &str =
    "SELECT id, transcript, word_count, duration, created_at, session_metadata
     FROM transcription_sessions";

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE transcription_sessions (
            id TEXT PRIMARY KEY NOT NULL,
            transcript TEXT NOT NULL DEFAULT '',
            word_count INTEGER NOT NULL DEFAULT 0,
            duration REAL NOT NULL DEFAULT 0.0,
            created_at TEXT NOT NULL,
            session_metadata TEXT
        );
        CREATE INDEX idx_transcription_sessions_created_at
            ON transcription_sessions (created_at);",
    )])
}

/// Session store on a single SQLite connection.
///
/// rusqlite is blocking, so every query runs on the blocking thread pool.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;

        info!("Opened session database at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migrations()
            .to_latest(&mut conn)
            .context("Failed to migrate session database")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| anyhow!("SQLite connection mutex poisoned"))?;
            f(&mut guard)
        })
        .await
        .context("SQLite task panicked")?
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<StoredSession> {
        let created_at: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(StoredSession {
            id: row.get("id")?,
            transcript: row.get("transcript")?,
            word_count: row.get::<_, i64>("word_count")?.max(0) as usize,
            duration_secs: row.get("duration")?,
            created_at,
            session_metadata: row.get("session_metadata")?,
        })
    }
}

#[async_trait::async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(&self, record: NewSessionRecord) -> Result<StoredSession> {
        self.with_conn(move |conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO transcription_sessions
                    (id, transcript, word_count, duration, created_at, session_metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.transcript,
                    record.word_count as i64,
                    record.duration_secs,
                    created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                    record.session_metadata,
                ],
            )
            .with_context(|| format!("Failed to insert session {}", record.id))?;

            Ok(StoredSession::from_new(record, created_at))
        })
        .await
    }

    async fn list_sessions(&self, skip: usize, limit: usize) -> Result<Vec<StoredSession>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
                SELECT_COLUMNS
            ))?;

            let sessions = stmt
                .query_map(params![limit as i64, skip as i64], Self::row_to_session)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("Failed to list sessions")?;

            Ok(sessions)
        })
        .await
    }

    async fn get_session(&self, id: &str) -> Result<Option<StoredSession>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [&id],
                Self::row_to_session,
            )
            .optional()
            .with_context(|| format!("Failed to load session {}", id))
        })
        .await
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn
                .execute("DELETE FROM transcription_sessions WHERE id = ?1", [&id])
                .with_context(|| format!("Failed to delete session {}", id))?;
            Ok(deleted > 0)
        })
        .await
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
