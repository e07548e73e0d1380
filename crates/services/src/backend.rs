use std::collections::BTreeMap;

use async_trait::async_trait;
use quiz_core::SessionToken;
use quiz_core::model::{Level, QuizId, QuizSpec, ScoreResult};

use crate::error::TransportError;
use crate::transport::AuthorizedTransport;
use crate::wire::{
    AskRequest, AskResponse, GenerateRequest, GeneratedQuiz, GoogleLoginRequest, LoginRequest,
    SignupRequest, SubmitRequest, SubmitResponse, TokenResponse,
};

/// Remote collaborators the session controller depends on: the auth
/// exchange, quiz generation, scoring and the assistant.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Exchange email and password for a session token.
    async fn login(&self, email: &str, password: &str) -> Result<SessionToken, TransportError>;

    /// Create an account and receive its first session token.
    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, TransportError>;

    /// Exchange a third-party identity credential for a session token.
    async fn google_login(&self, credential: &str) -> Result<SessionToken, TransportError>;

    async fn generate_quiz(&self, level: Level) -> Result<QuizSpec, TransportError>;

    /// Score `answers` (question position to chosen option) for `quiz_id`.
    async fn submit_quiz(
        &self,
        quiz_id: &QuizId,
        answers: &BTreeMap<usize, usize>,
    ) -> Result<ScoreResult, TransportError>;

    async fn ask_assistant(
        &self,
        quiz_id: &QuizId,
        question_index: usize,
        question: &str,
    ) -> Result<String, TransportError>;
}

/// `QuizBackend` over HTTP.
#[derive(Clone)]
pub struct HttpQuizBackend {
    transport: AuthorizedTransport,
}

impl HttpQuizBackend {
    #[must_use]
    pub fn new(transport: AuthorizedTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn login(&self, email: &str, password: &str) -> Result<SessionToken, TransportError> {
        let response: TokenResponse = self
            .transport
            .post_json("auth/login", &LoginRequest { email, password })
            .await?;
        response.into_token()
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, TransportError> {
        let response: TokenResponse = self
            .transport
            .post_json(
                "auth/signup",
                &SignupRequest {
                    email,
                    password,
                    name,
                },
            )
            .await?;
        response.into_token()
    }

    async fn google_login(&self, credential: &str) -> Result<SessionToken, TransportError> {
        let response: TokenResponse = self
            .transport
            .post_json("auth/google", &GoogleLoginRequest { credential })
            .await?;
        response.into_token()
    }

    async fn generate_quiz(&self, level: Level) -> Result<QuizSpec, TransportError> {
        let response: GeneratedQuiz = self
            .transport
            .post_json("quiz/generate", &GenerateRequest { level })
            .await?;
        response.into_quiz()
    }

    async fn submit_quiz(
        &self,
        quiz_id: &QuizId,
        answers: &BTreeMap<usize, usize>,
    ) -> Result<ScoreResult, TransportError> {
        let response: SubmitResponse = self
            .transport
            .post_json("quiz/submit", &SubmitRequest::new(quiz_id, answers))
            .await?;
        response.into_result()
    }

    async fn ask_assistant(
        &self,
        quiz_id: &QuizId,
        question_index: usize,
        question: &str,
    ) -> Result<String, TransportError> {
        let response: AskResponse = self
            .transport
            .post_json(
                "bot/ask",
                &AskRequest {
                    quiz_id: quiz_id.as_str(),
                    question_index,
                    question,
                },
            )
            .await?;
        Ok(response.answer)
    }
}
