//! JSON shapes exchanged with the quiz services, and their checked
//! conversion into domain records.

use std::collections::BTreeMap;

use quiz_core::SessionToken;
use quiz_core::model::{Level, Question, QuizError, QuizId, QuizSpec, ScoreResult};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleLoginRequest<'a> {
    pub credential: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    token: String,
}

impl TokenResponse {
    /// The issued token, without surrounding whitespace so it is a valid
    /// header value.
    pub fn into_token(self) -> Result<SessionToken, TransportError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(TransportError::InvalidResponse("empty token".into()));
        }
        Ok(SessionToken::new(token))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    pub level: Level,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeneratedQuiz {
    quiz_id: String,
    level: Level,
    questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    question: String,
    options: Vec<String>,
    #[serde(alias = "correct_option_index", alias = "correctOptionIndex")]
    correct_answer: usize,
}

impl GeneratedQuiz {
    pub fn into_quiz(self) -> Result<QuizSpec, TransportError> {
        let convert = || -> Result<QuizSpec, QuizError> {
            let id = QuizId::new(self.quiz_id)?;
            let questions = self
                .questions
                .into_iter()
                .enumerate()
                .map(|(index, q)| Question::new(index, q.question, q.options, q.correct_answer))
                .collect::<Result<Vec<_>, _>>()?;
            QuizSpec::new(id, self.level, questions)
        };
        convert().map_err(|err| TransportError::InvalidResponse(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub quiz_id: &'a str,
    pub answers: BTreeMap<String, usize>,
}

impl<'a> SubmitRequest<'a> {
    /// Answer keys travel as decimal strings (`{"0": 2}`).
    pub fn new(quiz_id: &'a QuizId, answers: &BTreeMap<usize, usize>) -> Self {
        Self {
            quiz_id: quiz_id.as_str(),
            answers: answers
                .iter()
                .map(|(question, option)| (question.to_string(), *option))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    score: u32,
    #[serde(default)]
    total: Option<u32>,
    answers: BTreeMap<String, usize>,
}

impl SubmitResponse {
    pub fn into_result(self) -> Result<ScoreResult, TransportError> {
        let answers = self
            .answers
            .into_iter()
            .map(|(key, option)| {
                key.trim()
                    .parse::<usize>()
                    .map(|question| (question, option))
                    .map_err(|_| TransportError::InvalidResponse(format!("bad answer key {key:?}")))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(ScoreResult {
            score: self.score,
            total: self.total,
            answers,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AskRequest<'a> {
    pub quiz_id: &'a str,
    pub question_index: usize,
    pub question: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AskResponse {
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_quiz_converts_to_domain() {
        let raw = r#"{
            "quiz_id": "65f0c1",
            "level": "medium",
            "questions": [
                {"question": "2 + 2?", "options": ["3", "4"], "correct_answer": 1},
                {"question": "Sky?", "options": ["blue", "green"], "correctOptionIndex": 0}
            ]
        }"#;
        let quiz = serde_json::from_str::<GeneratedQuiz>(raw)
            .unwrap()
            .into_quiz()
            .unwrap();
        assert_eq!(quiz.id().as_str(), "65f0c1");
        assert_eq!(quiz.level(), Level::Medium);
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz.question(0).unwrap().correct_option(), 1);
    }

    #[test]
    fn generated_quiz_with_bad_correct_index_is_rejected() {
        let raw = r#"{"quiz_id": "x", "level": "easy",
            "questions": [{"question": "?", "options": ["a"], "correct_answer": 3}]}"#;
        let err = serde_json::from_str::<GeneratedQuiz>(raw)
            .unwrap()
            .into_quiz()
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }

    #[test]
    fn generated_quiz_missing_fields_fails_to_parse() {
        let raw = r#"{"quiz_id": "x", "questions": []}"#;
        assert!(serde_json::from_str::<GeneratedQuiz>(raw).is_err());
    }

    #[test]
    fn submit_request_uses_string_keys() {
        let id = QuizId::new("q1").unwrap();
        let answers = BTreeMap::from([(0, 2), (2, 1)]);
        let json = serde_json::to_value(SubmitRequest::new(&id, &answers)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"quiz_id": "q1", "answers": {"0": 2, "2": 1}})
        );
    }

    #[test]
    fn submit_response_parses_keys() {
        let raw = r#"{"score": 1, "total": 3, "answers": {"0": 2, "2": 1}}"#;
        let result = serde_json::from_str::<SubmitResponse>(raw)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.total, Some(3));
        assert_eq!(result.answers, BTreeMap::from([(0, 2), (2, 1)]));

        let bad = r#"{"score": 0, "answers": {"first": 1}}"#;
        let err = serde_json::from_str::<SubmitResponse>(bad)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidResponse(_)));
    }

    #[test]
    fn empty_token_is_rejected() {
        let response: TokenResponse = serde_json::from_str(r#"{"token": ""}"#).unwrap();
        assert!(response.into_token().is_err());
        let response: TokenResponse = serde_json::from_str(r#"{"token": " \n "}"#).unwrap();
        assert!(response.into_token().is_err());
    }

    #[test]
    fn issued_token_is_trimmed() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"token": "  h.p.s\n"}"#).unwrap();
        assert_eq!(response.into_token().unwrap().as_str(), "h.p.s");
    }
}
