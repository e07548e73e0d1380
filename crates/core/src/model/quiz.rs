use thiserror::Error;

use super::ids::QuizId;
use super::level::Level;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a generated quiz is rejected before it reaches the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("quiz id is missing")]
    MissingId,
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("question {index} has empty text")]
    EmptyQuestion { index: usize },
    #[error("question {index} has no options")]
    NoOptions { index: usize },
    #[error("question {index} marks option {correct} correct but has {options} options")]
    CorrectOptionOutOfRange {
        index: usize,
        correct: usize,
        options: usize,
    },
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    correct_option: usize,
}

impl Question {
    /// Builds a question, checking that the correct option exists.
    ///
    /// `index` is only used to make errors point at the offending question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` when the text is blank, there are no options, or the
    /// correct option index is outside the options.
    pub fn new(
        index: usize,
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyQuestion { index });
        }
        if options.is_empty() {
            return Err(QuizError::NoOptions { index });
        }
        if correct_option >= options.len() {
            return Err(QuizError::CorrectOptionOutOfRange {
                index,
                correct: correct_option,
                options: options.len(),
            });
        }
        Ok(Self {
            text,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// A generated quiz, immutable for the lifetime of one attempt.
///
/// Questions keep the order the service produced them in; the review screen
/// joins them with the score result by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSpec {
    id: QuizId,
    level: Level,
    questions: Vec<Question>,
}

impl QuizSpec {
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` if `questions` is empty.
    pub fn new(id: QuizId, level: Level, questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        Ok(Self {
            id,
            level,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
