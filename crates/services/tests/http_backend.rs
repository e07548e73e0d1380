use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use chrono::Duration;
use quiz_core::SessionToken;
use quiz_core::model::{Level, QuizId};
use quiz_core::session::unsigned_token;
use quiz_core::time::fixed_clock;
use serde_json::{Value, json};
use services::{
    ApiConfig, AuthorizedTransport, ControllerError, GenerateOutcome, HttpQuizBackend, QuizBackend,
    QuizSessionController, TransportError,
};
use storage::repository::{InMemoryTokenStore, TokenStore};

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    authorization: Option<String>,
    body: Value,
}

/// In-process stand-in for the quiz service.
struct Stub {
    token: SessionToken,
    revoked: AtomicBool,
    seen: Mutex<Vec<Seen>>,
}

impl Stub {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            token: unsigned_token("Ada", "ada@example.com", None),
            revoked: AtomicBool::new(false),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self, path: &str) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|seen| seen.path == path)
            .cloned()
            .collect()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.token.as_str());
        !self.revoked.load(Ordering::SeqCst)
            && headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                == Some(expected.as_str())
    }
}

async fn handle(
    State(stub): State<Arc<Stub>>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let path = uri.path().to_string();
    stub.seen.lock().unwrap().push(Seen {
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    match path.as_str() {
        "/api/v1/auth/login" | "/api/v1/auth/signup" | "/api/v1/auth/google" => {
            if body["password"] == "wrong" {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Invalid credentials"})),
                );
            }
            (StatusCode::OK, Json(json!({"token": stub.token.as_str()})))
        }
        _ if !stub.authorized(&headers) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid token"})),
        ),
        "/api/v1/quiz/generate" if body["level"] == "hard" => {
            (StatusCode::OK, Json(json!({"questions": "nope"})))
        }
        "/api/v1/quiz/generate" => (
            StatusCode::OK,
            Json(json!({
                "quiz_id": "q-42",
                "level": body["level"],
                "questions": [
                    {"question": "2 + 2?", "options": ["3", "4", "5"], "correct_answer": 1},
                    {"question": "Capital of France?", "options": ["Paris", "Rome"], "correct_answer": 0},
                    {"question": "Rust mascot?", "options": ["Gopher", "Ferris", "Duke"], "correct_answer": 1},
                ],
            })),
        ),
        "/api/v1/quiz/submit" => {
            let answers = body["answers"].clone();
            let correct = [("0", 1), ("1", 0), ("2", 1)]
                .iter()
                .filter(|(key, option)| answers[*key] == json!(option))
                .count();
            (
                StatusCode::OK,
                Json(json!({"score": correct, "total": 3, "answers": answers})),
            )
        }
        "/api/v1/bot/ask" => (
            StatusCode::OK,
            Json(json!({"answer": format!("Look again at question {}.", body["question_index"])})),
        ),
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))),
    }
}

async fn spawn_stub(stub: Arc<Stub>) -> ApiConfig {
    let app = Router::new().fallback(handle).with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ApiConfig::new(&format!("http://{addr}")).unwrap()
}

fn backend(config: &ApiConfig, store: &InMemoryTokenStore) -> HttpQuizBackend {
    let transport = AuthorizedTransport::new(config, Arc::new(store.clone())).unwrap();
    HttpQuizBackend::new(transport)
}

#[tokio::test]
async fn login_is_anonymous_and_later_calls_carry_the_bearer_token() {
    let stub = Stub::new();
    let config = spawn_stub(stub.clone()).await;
    let store = InMemoryTokenStore::new();
    let backend = backend(&config, &store);

    let token = backend.login("ada@example.com", "secret").await.unwrap();
    assert_eq!(token, stub.token);
    store.set(&token).await.unwrap();

    let quiz = backend.generate_quiz(Level::Medium).await.unwrap();
    assert_eq!(quiz.id().as_str(), "q-42");
    assert_eq!(quiz.level(), Level::Medium);
    assert_eq!(quiz.len(), 3);
    assert_eq!(quiz.question(2).unwrap().correct_option(), 1);

    let login = &stub.seen("/api/v1/auth/login")[0];
    assert_eq!(login.authorization, None);
    assert_eq!(
        login.body,
        json!({"email": "ada@example.com", "password": "secret"})
    );

    let generate = &stub.seen("/api/v1/quiz/generate")[0];
    assert_eq!(
        generate.authorization.as_deref(),
        Some(format!("Bearer {}", stub.token.as_str()).as_str())
    );
    assert_eq!(generate.body, json!({"level": "medium"}));
}

#[tokio::test]
async fn blank_token_sends_no_header_and_rejection_keeps_detail() {
    let stub = Stub::new();
    let config = spawn_stub(stub.clone()).await;
    let store = InMemoryTokenStore::with_token(SessionToken::new("   "));
    let backend = backend(&config, &store);

    let err = backend.generate_quiz(Level::Easy).await.unwrap_err();
    match &err {
        TransportError::Remote { status, detail } => {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(detail, "Invalid token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_unauthorized());
    assert_eq!(stub.seen("/api/v1/quiz/generate")[0].authorization, None);
}

#[tokio::test]
async fn submit_uses_string_keys_and_reads_score() {
    let stub = Stub::new();
    let config = spawn_stub(stub.clone()).await;
    let store = InMemoryTokenStore::with_token(stub.token.clone());
    let backend = backend(&config, &store);

    let quiz_id = QuizId::new("q-42").unwrap();
    let answers = BTreeMap::from([(0, 1), (2, 0)]);
    let result = backend.submit_quiz(&quiz_id, &answers).await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(result.total, Some(3));
    assert_eq!(result.answers, answers);

    assert_eq!(
        stub.seen("/api/v1/quiz/submit")[0].body,
        json!({"quiz_id": "q-42", "answers": {"0": 1, "2": 0}})
    );

    let answer = backend
        .ask_assistant(&quiz_id, 2, "Why Ferris?")
        .await
        .unwrap();
    assert_eq!(answer, "Look again at question 2.");
    assert_eq!(
        stub.seen("/api/v1/bot/ask")[0].body,
        json!({"quiz_id": "q-42", "question_index": 2, "question": "Why Ferris?"})
    );
}

#[tokio::test]
async fn malformed_quiz_is_an_invalid_response() {
    let stub = Stub::new();
    let config = spawn_stub(stub.clone()).await;
    let store = InMemoryTokenStore::with_token(stub.token.clone());
    let backend = backend(&config, &store);

    let err = backend.generate_quiz(Level::Hard).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidResponse(_)));
}

#[tokio::test]
async fn controller_runs_a_full_attempt_over_http() {
    let stub = Stub::new();
    let config = spawn_stub(stub.clone()).await;
    let store = InMemoryTokenStore::new();
    let backend = Arc::new(backend(&config, &store));
    let mut controller = QuizSessionController::new(fixed_clock(), Arc::new(store.clone()), backend);

    let err = controller.login("ada@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ControllerError::Transport(_)));
    assert!(!controller.is_authenticated());

    controller.login("ada@example.com", "secret").await.unwrap();
    assert_eq!(store.get().await.unwrap(), Some(stub.token.clone()));

    assert_eq!(
        controller.generate(Level::Easy).await.unwrap(),
        GenerateOutcome::Ready
    );
    controller.record_answer(0, 1).unwrap();
    controller.record_answer(1, 1).unwrap();
    let review = controller.submit().await.unwrap();
    assert_eq!(review.score(), 1);
    assert_eq!(review.total(), 3);

    let answer = controller.ask_assistant(1, "Why Paris?").await.unwrap();
    assert_eq!(answer, "Look again at question 1.");

    stub.revoked.store(true, Ordering::SeqCst);
    controller.clock_mut().advance(Duration::seconds(60));
    let err = controller.generate(Level::Easy).await.unwrap_err();
    assert!(matches!(err, ControllerError::SessionExpired));
    assert!(!controller.is_authenticated());
    assert!(store.get().await.unwrap().is_none());
}
