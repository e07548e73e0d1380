#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod transport;
mod wire;

pub use quiz_core::Clock;

pub use backend::{HttpQuizBackend, QuizBackend};
pub use config::{ApiConfig, ConfigError};
pub use controller::{
    Attempt, FailedStep, GenerateOutcome, Progress, QuizPhase, QuizSessionController, QuizState,
};
pub use countdown::Countdown;
pub use error::{ControllerError, TransportError};
pub use transport::AuthorizedTransport;
