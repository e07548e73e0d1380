//! Plain-text rendering for the terminal client. Numbers shown to the user
//! start at 1.

use std::fmt::Write as _;

use quiz_core::model::{AnswerLedger, AnswerStatus, QuizReview, QuizSpec};
use services::{QuizPhase, QuizSessionController};

pub fn quiz(quiz: &QuizSpec, ledger: &AnswerLedger) -> String {
    let mut out = format!(
        "quiz {} ({}), {} of {} answered\n",
        quiz.id(),
        quiz.level(),
        ledger.answered_count(),
        quiz.len()
    );
    for (index, question) in quiz.questions().iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", index + 1, question.text());
        let selected = ledger.get(index);
        for (option, text) in question.options().iter().enumerate() {
            let marker = if selected == Some(option) { '*' } else { ' ' };
            let _ = writeln!(out, "  {marker} {}) {text}", option + 1);
        }
    }
    out
}

pub fn review(review: &QuizReview) -> String {
    let mut out = format!("score: {} / {}\n", review.score(), review.total());
    for entry in review.entries() {
        let verdict = match entry.status {
            AnswerStatus::Correct => "correct",
            AnswerStatus::Incorrect => "incorrect",
            AnswerStatus::NotAnswered => "not answered",
        };
        let _ = writeln!(
            out,
            "\n{}. {} [{verdict}]",
            entry.index + 1,
            entry.question.text()
        );
        if let Some(selected) = entry.selected_text() {
            let _ = writeln!(out, "   your answer: {selected}");
        }
        if entry.status != AnswerStatus::Correct {
            if let Some(correct) = entry.correct_text() {
                let _ = writeln!(out, "   correct answer: {correct}");
            }
        }
    }
    out
}

pub fn status(controller: &QuizSessionController, countdown: u32) -> String {
    let mut out = match controller.user() {
        Some(user) => format!("signed in as {} <{}>\n", user.display_name(), user.identity()),
        None => "signed out\n".to_string(),
    };
    let _ = write!(out, "phase: {:?}", controller.phase());
    if let Some(progress) = controller.progress() {
        let _ = write!(out, " ({} of {} answered)", progress.answered, progress.total);
    }
    if controller.phase() == QuizPhase::Failed {
        if let Some(message) = controller.failure() {
            let _ = write!(out, "\nlast request failed: {message} (type `ack`)");
        }
    }
    if countdown > 0 {
        let _ = write!(out, "\nnext quiz in {countdown}s");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Level, Question, QuizId, ScoreResult};
    use std::collections::BTreeMap;

    fn sample() -> QuizSpec {
        let questions = vec![
            Question::new(0, "2 + 2?", vec!["3".into(), "4".into()], 1).unwrap(),
            Question::new(1, "Rust mascot?", vec!["Ferris".into(), "Duke".into()], 0).unwrap(),
        ];
        QuizSpec::new(QuizId::new("q-1").unwrap(), Level::Easy, questions).unwrap()
    }

    #[test]
    fn quiz_marks_selected_option() {
        let mut ledger = AnswerLedger::new();
        ledger.record(0, 1);
        let text = quiz(&sample(), &ledger);
        assert!(text.starts_with("quiz q-1 (easy), 1 of 2 answered"));
        assert!(text.contains("  * 2) 4"));
        assert!(text.contains("    1) Ferris"));
    }

    #[test]
    fn review_shows_verdicts_and_corrections() {
        let result = ScoreResult {
            score: 0,
            total: None,
            answers: BTreeMap::from([(0, 0)]),
        };
        let text = review(&QuizReview::new(sample(), result));
        assert!(text.starts_with("score: 0 / 2"));
        assert!(text.contains("1. 2 + 2? [incorrect]"));
        assert!(text.contains("your answer: 3"));
        assert!(text.contains("correct answer: 4"));
        assert!(text.contains("2. Rust mascot? [not answered]"));
    }
}
