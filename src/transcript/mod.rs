//! Session transcript store.
//!
//! Sessions own an append-only, ordered message log. Assistant messages
//! carry their attributed sources in the `extra` JSON column so the HTTP
//! layer can replay them without re-running retrieval.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use crate::core::errors::ApiError;
use crate::rag::{ChatTurn, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub message_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: i64,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Clone)]
pub struct TranscriptStore {
    pool: SqlitePool,
}

impl TranscriptStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to transcript db: {}", e)))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to enable foreign keys: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init sessions table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                extra JSON,
                FOREIGN KEY(session_id) REFERENCES sessions(id) ON DELETE CASCADE
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init messages table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages(session_id)")
            .execute(&pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn create_session(&self, title: Option<String>) -> Result<String, ApiError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO sessions (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&session_id)
            .bind(title)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create session: {}", e)))?;

        Ok(session_id)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, ApiError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let count: i64 = sqlx::query("SELECT COUNT(*) FROM messages WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map(|r| r.get(0))
            .unwrap_or(0);

        Ok(Some(SessionInfo {
            id: row.try_get::<String, _>("id").unwrap_or_default(),
            title: row.try_get::<Option<String>, _>("title").unwrap_or(None),
            created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
            updated_at: row.try_get::<String, _>("updated_at").unwrap_or_default(),
            message_count: count,
        }))
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ApiError> {
        let rows = sqlx::query(
            "SELECT s.id, s.title, s.created_at, s.updated_at, \
             COUNT(m.id) as msg_count \
             FROM sessions s \
             LEFT JOIN messages m ON s.id = m.session_id \
             GROUP BY s.id \
             ORDER BY s.updated_at DESC \
             LIMIT 100",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(SessionInfo {
                id: row.try_get::<String, _>("id").unwrap_or_default(),
                title: row.try_get::<Option<String>, _>("title").unwrap_or(None),
                created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
                updated_at: row.try_get::<String, _>("updated_at").unwrap_or_default(),
                message_count: row.try_get::<i64, _>("msg_count").unwrap_or(0),
            });
        }
        Ok(sessions)
    }

    /// Delete a session and (by cascade) its messages. Returns whether a
    /// session row was actually removed.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a message, creating the session on first use.
    pub async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        sources: &[String],
    ) -> Result<i64, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();
        let extra = if sources.is_empty() {
            None
        } else {
            Some(json!({ "sources": sources }))
        };

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("INSERT OR IGNORE INTO sessions (id, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        let result = sqlx::query(
            "INSERT INTO messages (session_id, role, content, created_at, extra) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(now)
        .bind(extra)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;

        Ok(result.last_insert_rowid())
    }

    /// Messages in insertion order. `limit <= 0` returns the whole
    /// transcript; a positive limit returns the most recent messages,
    /// still oldest-first.
    pub async fn messages(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<TranscriptMessage>, ApiError> {
        let rows = if limit > 0 {
            sqlx::query(
                "SELECT * FROM (SELECT * FROM messages WHERE session_id = ? ORDER BY id DESC LIMIT ?) ORDER BY id ASC",
            )
            .bind(session_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query("SELECT * FROM messages WHERE session_id = ? ORDER BY id ASC")
                .bind(session_id)
                .fetch_all(&self.pool)
                .await
                .map_err(ApiError::internal)?
        };

        let mut messages = Vec::new();
        for row in rows {
            let extra = row.try_get::<Option<Value>, _>("extra").unwrap_or(None);
            let sources = extra
                .as_ref()
                .and_then(|v| v.get("sources"))
                .and_then(|v| v.as_array())
                .map(|list| {
                    list.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();

            messages.push(TranscriptMessage {
                id: row.try_get::<i64, _>("id").unwrap_or_default(),
                session_id: row.try_get::<String, _>("session_id").unwrap_or_default(),
                role: parse_role(&row.try_get::<String, _>("role").unwrap_or_default()),
                content: row.try_get::<String, _>("content").unwrap_or_default(),
                created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
                sources,
            });
        }

        Ok(messages)
    }

    /// The full transcript as engine-facing chat turns.
    pub async fn chat_turns(&self, session_id: &str) -> Result<Vec<ChatTurn>, ApiError> {
        let messages = self.messages(session_id, 0).await?;
        Ok(messages
            .into_iter()
            .map(|msg| ChatTurn {
                role: msg.role,
                content: msg.content,
                sources: msg.sources,
            })
            .collect())
    }
}

fn parse_role(raw: &str) -> Role {
    match raw {
        "assistant" => Role::Assistant,
        _ => Role::User,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> TranscriptStore {
        let tmp = std::env::temp_dir().join(format!(
            "groundcrew-transcript-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        TranscriptStore::new(tmp).await.unwrap()
    }

    #[tokio::test]
    async fn create_list_and_delete_sessions() {
        let store = test_store().await;

        let id = store
            .create_session(Some("Baggage questions".to_string()))
            .await
            .unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].title.as_deref(), Some("Baggage questions"));
        assert_eq!(sessions[0].message_count, 0);

        assert!(store.delete_session(&id).await.unwrap());
        assert!(!store.delete_session(&id).await.unwrap());
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_and_read_back_with_sources() {
        let store = test_store().await;
        let id = store.create_session(None).await.unwrap();

        store
            .append_message(&id, Role::User, "What is the baggage allowance?", &[])
            .await
            .unwrap();
        store
            .append_message(
                &id,
                Role::Assistant,
                "23kg in economy.",
                &["policy.pdf".to_string()],
            )
            .await
            .unwrap();

        let messages = store.messages(&id, 0).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert!(messages[0].sources.is_empty());
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].sources, vec!["policy.pdf"]);
    }

    #[tokio::test]
    async fn chat_turns_preserve_order() {
        let store = test_store().await;
        let id = store.create_session(None).await.unwrap();

        store
            .append_message(&id, Role::User, "first", &[])
            .await
            .unwrap();
        store
            .append_message(&id, Role::Assistant, "second", &[])
            .await
            .unwrap();
        store
            .append_message(&id, Role::User, "third", &[])
            .await
            .unwrap();

        let turns = store.chat_turns(&id).await.unwrap();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn appending_to_an_unknown_session_creates_it() {
        let store = test_store().await;

        store
            .append_message("implicit", Role::User, "hello", &[])
            .await
            .unwrap();

        let session = store.get_session("implicit").await.unwrap().unwrap();
        assert_eq!(session.message_count, 1);
    }

    #[tokio::test]
    async fn deleting_a_session_cascades_to_messages() {
        let store = test_store().await;
        let id = store.create_session(None).await.unwrap();
        store
            .append_message(&id, Role::User, "hello", &[])
            .await
            .unwrap();

        store.delete_session(&id).await.unwrap();

        let messages = store.messages(&id, 0).await.unwrap();
        assert!(messages.is_empty());
    }
}
