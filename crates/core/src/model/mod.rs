mod answers;
mod ids;
mod level;
mod quiz;
mod review;
mod user;

pub use answers::AnswerLedger;
pub use ids::QuizId;
pub use level::{Level, LevelError};
pub use quiz::{Question, QuizError, QuizSpec};
pub use review::{AnswerStatus, QuizReview, ReviewEntry, ScoreResult};
pub use user::UserSession;
