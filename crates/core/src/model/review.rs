use std::collections::BTreeMap;

use super::quiz::{Question, QuizSpec};

/// Authoritative outcome returned by the scoring service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: u32,
    /// Question count as reported by the service, when it sends one.
    pub total: Option<u32>,
    pub answers: BTreeMap<usize, usize>,
}

/// How a single question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    NotAnswered,
}

/// One row of the review screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry<'a> {
    pub index: usize,
    pub question: &'a Question,
    pub selected: Option<usize>,
    pub status: AnswerStatus,
}

impl ReviewEntry<'_> {
    #[must_use]
    pub fn correct_text(&self) -> Option<&str> {
        self.question.option(self.question.correct_option())
    }

    #[must_use]
    pub fn selected_text(&self) -> Option<&str> {
        self.selected.and_then(|idx| self.question.option(idx))
    }
}

/// A finished attempt: the quiz as generated, paired with its score.
///
/// The scoring service does not echo question text, so correctness is
/// reconstructed here by joining both sides on question position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizReview {
    quiz: QuizSpec,
    result: ScoreResult,
}

impl QuizReview {
    #[must_use]
    pub fn new(quiz: QuizSpec, result: ScoreResult) -> Self {
        Self { quiz, result }
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizSpec {
        &self.quiz
    }

    #[must_use]
    pub fn result(&self) -> &ScoreResult {
        &self.result
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.result.score
    }

    /// Question count, preferring the service's figure.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.result
            .total
            .unwrap_or_else(|| u32::try_from(self.quiz.len()).unwrap_or(u32::MAX))
    }

    pub fn entries(&self) -> impl Iterator<Item = ReviewEntry<'_>> + '_ {
        self.quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let selected = self.result.answers.get(&index).copied();
                let status = match selected {
                    None => AnswerStatus::NotAnswered,
                    Some(choice) if choice == question.correct_option() => AnswerStatus::Correct,
                    Some(_) => AnswerStatus::Incorrect,
                };
                ReviewEntry {
                    index,
                    question,
                    selected,
                    status,
                }
            })
    }
}
