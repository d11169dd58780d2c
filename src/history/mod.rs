// Chat history module
// Append/read log of chat turns keyed by session id, backed by SQLite

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::path::Path;
use tracing::debug;

pub type DbPool = Pool<Sqlite>;

/// One stored chat turn. `user_message` is absent for bot-initiated rows
/// such as the session greeting.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ChatTurn {
    pub id: i64,
    pub session_id: String,
    pub user_message: Option<String>,
    pub bot_response: String,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ChatHistory {
    pool: DbPool,
}

impl ChatHistory {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        if let Some(parent) = database_path.as_ref().parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to create history connection pool")?;

        let history = Self { pool };
        history.init_schema().await?;

        Ok(history)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                user_message TEXT,
                bot_response TEXT NOT NULL,
                created_date DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create chat_history table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_history_session
             ON chat_history (session_id)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create chat_history index")?;

        debug!("Chat history schema ready");
        Ok(())
    }

    /// Append one turn to a session's log.
    #[inline]
    pub async fn append(
        &self,
        session_id: &str,
        user_message: Option<&str>,
        bot_response: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_history (session_id, user_message, bot_response)
             VALUES (?, ?, ?)",
        )
        .bind(session_id)
        .bind(user_message)
        .bind(bot_response)
        .execute(&self.pool)
        .await
        .context("Failed to append chat turn")?;

        Ok(())
    }

    /// All turns of a session in insertion order.
    #[inline]
    pub async fn for_session(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        let turns = sqlx::query_as::<_, ChatTurn>(
            "SELECT id, session_id, user_message, bot_response, created_date
             FROM chat_history
             WHERE session_id = ?
             ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read chat history")?;

        Ok(turns)
    }

    /// A fresh session has no history yet; the caller greets it.
    #[inline]
    pub async fn is_fresh(&self, session_id: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_history WHERE session_id = ?")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count chat turns")?;

        Ok(count == 0)
    }

    /// Total stored turns across all sessions (status reporting).
    #[inline]
    pub async fn total_turns(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_history")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count chat history")?;

        Ok(count)
    }
}
