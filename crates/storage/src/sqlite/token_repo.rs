use async_trait::async_trait;
use chrono::Utc;
use quiz_core::SessionToken;
use sqlx::Row;

use crate::repository::{SESSION_TOKEN_KEY, StorageError, TokenStore};

use super::SqliteRepository;

#[async_trait]
impl TokenStore for SqliteRepository {
    async fn set(&self, token: &SessionToken) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO session_tokens (key, token, stored_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                token = excluded.token,
                stored_at = excluded.stored_at
            ",
        )
        .bind(SESSION_TOKEN_KEY)
        .bind(token.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        tracing::debug!("session token stored");
        Ok(())
    }

    async fn get(&self) -> Result<Option<SessionToken>, StorageError> {
        let row = sqlx::query("SELECT token FROM session_tokens WHERE key = ?1")
            .bind(SESSION_TOKEN_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let token: String = row
            .try_get("token")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(SessionToken::new(token)))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_tokens WHERE key = ?1")
            .bind(SESSION_TOKEN_KEY)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        tracing::debug!("session token cleared");
        Ok(())
    }
}
