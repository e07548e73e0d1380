//! Shared error types for the services crate.

use reqwest::StatusCode;
use thiserror::Error;

use quiz_core::MalformedTokenError;
use storage::repository::StorageError;

use crate::controller::QuizPhase;

/// Failures talking to the remote quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("request failed with status {status}: {detail}")]
    Remote { status: StatusCode, detail: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TransportError {
    /// HTTP status of the failure, when the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Remote { status, .. } => Some(*status),
            TransportError::Http(err) => err.status(),
            _ => None,
        }
    }

    /// True when the service rejected the credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Errors emitted by `QuizSessionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("session is no longer valid; sign in again")]
    SessionExpired,
    #[error("cannot {action} while {phase:?}")]
    InvalidState {
        action: &'static str,
        phase: QuizPhase,
    },
    #[error("question {index} does not exist (quiz has {len})")]
    QuestionOutOfRange { index: usize, len: usize },
    #[error("question {question} has no option {option} (it has {options})")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        options: usize,
    },
    #[error(transparent)]
    Token(#[from] MalformedTokenError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
