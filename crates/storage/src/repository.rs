use async_trait::async_trait;
use quiz_core::SessionToken;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage key under which the session token is kept.
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable slot for the current session token.
///
/// Exactly one token is held at a time; `set` replaces it wholesale and
/// `clear` is the only way to remove it.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the token cannot be written.
    async fn set(&self, token: &SessionToken) -> Result<(), StorageError>;

    /// Fetch the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self) -> Result<Option<SessionToken>, StorageError>;

    /// Remove the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Process-local token store, for tests and ephemeral sessions.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    token: Arc<Mutex<Option<SessionToken>>>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`, as if left over from an earlier run.
    #[must_use]
    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: Arc::new(Mutex::new(Some(token))),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn set(&self, token: &SessionToken) -> Result<(), StorageError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(token.clone());
        Ok(())
    }

    async fn get(&self) -> Result<Option<SessionToken>, StorageError> {
        let guard = self
            .token
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Storage handles behind trait objects so backends can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub tokens: Arc<dyn TokenStore>,
}
