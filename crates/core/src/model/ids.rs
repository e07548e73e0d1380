use serde::{Deserialize, Serialize};
use std::fmt;

use super::quiz::QuizError;

/// Server-assigned identifier of one generated quiz.
///
/// The value is opaque to the client; it is only echoed back on submit and
/// assistant requests.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(String);

impl QuizId {
    /// Creates a `QuizId` from a non-blank string.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MissingId` if the value is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, QuizError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(QuizError::MissingId);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
