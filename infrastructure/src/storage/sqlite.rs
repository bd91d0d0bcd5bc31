//! SQLite session store
//!
//! rusqlite with r2d2 connection pooling. Blocking database work runs on
//! the tokio blocking pool. State rows carry a version that every write
//! checks and bumps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lattia_application::ports::session_store::{
    Profile, ProfileId, SessionStore, StoreError, StoredMessage, TurnCommit, VersionedState,
};
use lattia_domain::{InterviewState, Role};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS interview_states (
    profile_id INTEGER PRIMARY KEY REFERENCES profiles(id) ON DELETE CASCADE,
    state TEXT NOT NULL,
    version INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_profile ON messages(profile_id, id);
";

#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DbPool,
}

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

fn enable_foreign_keys(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

impl SqliteSessionStore {
    /// Open (or create) the database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(db_err)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            enable_foreign_keys(conn)?;
            conn.busy_timeout(BUSY_TIMEOUT)
        });
        let pool = Pool::builder().max_size(8).build(manager).map_err(db_err)?;

        let store = Self { pool };
        store.init_schema()?;
        info!("SQLite session store at {}", path.display());
        Ok(store)
    }

    /// In-memory database; a single connection so every call sees the same data.
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(db_err)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Database(format!("blocking task failed: {}", e)))?
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {:?}: {}", raw, e)))
}

fn parse_role(raw: &str) -> Result<Role, StoreError> {
    raw.parse::<Role>().map_err(StoreError::Serialization)
}

fn profile_exists(conn: &Connection, id: ProfileId) -> Result<bool, StoreError> {
    conn.query_row("SELECT 1 FROM profiles WHERE id = ?1", params![id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(db_err)
}

fn read_profile(conn: &Connection, id: ProfileId) -> Result<Profile, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name, created_at FROM profiles WHERE id = ?1",
            params![id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
        )
        .optional()
        .map_err(db_err)?
        .ok_or(StoreError::NotFound(id))?;
    Ok(Profile {
        id: row.0,
        name: row.1,
        created_at: parse_time(&row.2)?,
    })
}

fn insert_message(
    conn: &Connection,
    id: ProfileId,
    role: Role,
    content: &str,
) -> Result<StoredMessage, StoreError> {
    let created_at = now();
    conn.execute(
        "INSERT INTO messages (profile_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, role.as_str(), content, created_at],
    )
    .map_err(db_err)?;
    Ok(StoredMessage {
        id: conn.last_insert_rowid(),
        profile_id: id,
        role,
        content: content.to_string(),
        created_at: parse_time(&created_at)?,
    })
}

/// Write `state` if the stored version still equals `expected`.
fn write_state(
    conn: &Connection,
    id: ProfileId,
    state: &InterviewState,
    expected: u64,
) -> Result<u64, StoreError> {
    let json = serde_json::to_string(state)?;
    let updated = conn
        .execute(
            "UPDATE interview_states SET state = ?1, version = version + 1, updated_at = ?2
             WHERE profile_id = ?3 AND version = ?4",
            params![json, now(), id, expected as i64],
        )
        .map_err(db_err)?;

    if updated == 1 {
        return Ok(expected + 1);
    }

    let actual: Option<i64> = conn
        .query_row(
            "SELECT version FROM interview_states WHERE profile_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;
    match actual {
        None => Err(StoreError::NotFound(id)),
        Some(actual) => Err(StoreError::Conflict {
            id,
            expected,
            actual: actual as u64,
        }),
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create_profile(&self, name: &str) -> Result<Profile, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(db_err)?;
            let created_at = now();
            match tx.execute(
                "INSERT INTO profiles (name, created_at) VALUES (?1, ?2)",
                params![name, created_at],
            ) {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    return Err(StoreError::AlreadyExists(name));
                }
                Err(e) => return Err(db_err(e)),
            }
            let id = tx.last_insert_rowid();
            let state = serde_json::to_string(&InterviewState::new())?;
            tx.execute(
                "INSERT INTO interview_states (profile_id, state, version, updated_at)
                 VALUES (?1, ?2, 0, ?3)",
                params![id, state, created_at],
            )
            .map_err(db_err)?;
            tx.commit().map_err(db_err)?;

            Ok(Profile {
                id,
                name,
                created_at: parse_time(&created_at)?,
            })
        })
        .await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, created_at FROM profiles ORDER BY id DESC")
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })
                .map_err(db_err)?;

            let mut profiles = Vec::new();
            for row in rows {
                let (id, name, created_at) = row.map_err(db_err)?;
                profiles.push(Profile {
                    id,
                    name,
                    created_at: parse_time(&created_at)?,
                });
            }
            Ok(profiles)
        })
        .await
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Profile, StoreError> {
        self.with_conn(move |conn| read_profile(conn, id)).await
    }

    async fn delete_profile(&self, id: ProfileId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let deleted = conn
                .execute("DELETE FROM profiles WHERE id = ?1", params![id])
                .map_err(db_err)?;
            if deleted == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn load_state(&self, id: ProfileId) -> Result<VersionedState, StoreError> {
        self.with_conn(move |conn| {
            let (json, version): (String, i64) = conn
                .query_row(
                    "SELECT state, version FROM interview_states WHERE profile_id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(db_err)?
                .ok_or(StoreError::NotFound(id))?;
            Ok(VersionedState {
                state: serde_json::from_str(&json)?,
                version: version as u64,
            })
        })
        .await
    }

    async fn save_state(
        &self,
        id: ProfileId,
        state: &InterviewState,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let state = state.clone();
        self.with_conn(move |conn| write_state(conn, id, &state, expected_version))
            .await
    }

    async fn append_message(
        &self,
        id: ProfileId,
        role: Role,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        let content = content.to_string();
        self.with_conn(move |conn| {
            if !profile_exists(conn, id)? {
                return Err(StoreError::NotFound(id));
            }
            insert_message(conn, id, role, &content)
        })
        .await
    }

    async fn messages(&self, id: ProfileId) -> Result<Vec<StoredMessage>, StoreError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, role, content, created_at FROM messages
                     WHERE profile_id = ?1 ORDER BY id",
                )
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(db_err)?;

            let mut messages = Vec::new();
            for row in rows {
                let (message_id, role, content, created_at) = row.map_err(db_err)?;
                messages.push(StoredMessage {
                    id: message_id,
                    profile_id: id,
                    role: parse_role(&role)?,
                    content,
                    created_at: parse_time(&created_at)?,
                });
            }
            Ok(messages)
        })
        .await
    }

    async fn commit_turn(
        &self,
        id: ProfileId,
        commit: TurnCommit<'_>,
    ) -> Result<StoredMessage, StoreError> {
        let user_message = commit.user_message.to_string();
        let assistant_message = commit.assistant_message.to_string();
        let state = commit.state.clone();
        let expected = commit.expected_version;

        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(db_err)?;
            write_state(&tx, id, &state, expected)?;
            insert_message(&tx, id, Role::User, &user_message)?;
            let assistant = insert_message(&tx, id, Role::Assistant, &assistant_message)?;
            tx.commit().map_err(db_err)?;
            Ok(assistant)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract_tests;

    #[tokio::test]
    async fn test_in_memory_store_contract() {
        let store = SqliteSessionStore::new_in_memory().unwrap();
        contract_tests::run_all(&store).await;
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("lattia.db");

        let id = {
            let store = SqliteSessionStore::open(&path).unwrap();
            let profile = store.create_profile("Ana").await.unwrap();
            store
                .append_message(profile.id, Role::Assistant, "Hello Ana!")
                .await
                .unwrap();
            let mut state = store.load_state(profile.id).await.unwrap().state;
            state.mark_done();
            store.save_state(profile.id, &state, 0).await.unwrap();
            profile.id
        };

        let store = SqliteSessionStore::open(&path).unwrap();
        assert_eq!(store.get_profile(id).await.unwrap().name, "Ana");
        assert_eq!(store.messages(id).await.unwrap().len(), 1);
        let loaded = store.load_state(id).await.unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.state.is_done());
    }

    #[tokio::test]
    async fn test_file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteSessionStore::open(dir.path().join("lattia.db")).unwrap();
        contract_tests::run_all(&store).await;
    }
}
