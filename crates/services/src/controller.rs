use std::fmt;
use std::sync::Arc;

use quiz_core::model::{AnswerLedger, Level, QuizReview, QuizSpec, UserSession};
use quiz_core::{Clock, CooldownDecision, CooldownGovernor, SessionToken};
use storage::repository::TokenStore;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::QuizBackend;
use crate::countdown::Countdown;
use crate::error::{ControllerError, TransportError};

//
// ─── STATE ────────────────────────────────────────────────────────────────────
//

/// One quiz being answered: the generated content plus the user's picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub quiz: QuizSpec,
    pub ledger: AnswerLedger,
}

impl Attempt {
    #[must_use]
    pub fn new(quiz: QuizSpec) -> Self {
        Self {
            quiz,
            ledger: AnswerLedger::new(),
        }
    }
}

/// Which remote step a `Failed` state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    Generation,
    Submission,
}

/// Lifecycle of the current quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    Idle,
    Generating {
        level: Level,
    },
    Ready(Attempt),
    Submitting(Attempt),
    Reviewing(QuizReview),
    Failed {
        step: FailedStep,
        message: String,
        /// The attempt to return to after a failed submission.
        resume: Option<Attempt>,
    },
}

/// Data-free view of `QuizState`, for guards and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Generating,
    Ready,
    Submitting,
    Reviewing,
    Failed,
}

impl QuizState {
    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        match self {
            QuizState::Idle => QuizPhase::Idle,
            QuizState::Generating { .. } => QuizPhase::Generating,
            QuizState::Ready(_) => QuizPhase::Ready,
            QuizState::Submitting(_) => QuizPhase::Submitting,
            QuizState::Reviewing(_) => QuizPhase::Reviewing,
            QuizState::Failed { .. } => QuizPhase::Failed,
        }
    }
}

/// Result of a generate request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A quiz arrived and the controller is `Ready`.
    Ready,
    /// Refused by the cooldown; no request was sent.
    Throttled { remaining_secs: u32 },
}

/// Answering progress for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

//
// ─── CONTROLLER ───────────────────────────────────────────────────────────────
//

/// Owns the signed-in session and drives one quiz at a time through
/// generate, answer, submit and review.
///
/// All operations take `&mut self`, so at most one generation or submission
/// is in flight per controller.
pub struct QuizSessionController {
    clock: Clock,
    tokens: Arc<dyn TokenStore>,
    backend: Arc<dyn QuizBackend>,
    user: Option<UserSession>,
    cooldown: CooldownGovernor,
    countdown: Countdown,
    state: QuizState,
}

impl QuizSessionController {
    #[must_use]
    pub fn new(clock: Clock, tokens: Arc<dyn TokenStore>, backend: Arc<dyn QuizBackend>) -> Self {
        Self {
            clock,
            tokens,
            backend,
            user: None,
            cooldown: CooldownGovernor::new(),
            countdown: Countdown::new(),
            state: QuizState::Idle,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.state.phase()
    }

    /// The quiz of the current attempt, in any phase that has one.
    #[must_use]
    pub fn quiz(&self) -> Option<&QuizSpec> {
        match &self.state {
            QuizState::Ready(attempt) | QuizState::Submitting(attempt) => Some(&attempt.quiz),
            QuizState::Failed {
                resume: Some(attempt),
                ..
            } => Some(&attempt.quiz),
            QuizState::Reviewing(review) => Some(review.quiz()),
            _ => None,
        }
    }

    #[must_use]
    pub fn ledger(&self) -> Option<&AnswerLedger> {
        match &self.state {
            QuizState::Ready(attempt) | QuizState::Submitting(attempt) => Some(&attempt.ledger),
            QuizState::Failed {
                resume: Some(attempt),
                ..
            } => Some(&attempt.ledger),
            _ => None,
        }
    }

    #[must_use]
    pub fn review(&self) -> Option<&QuizReview> {
        match &self.state {
            QuizState::Reviewing(review) => Some(review),
            _ => None,
        }
    }

    /// Message of the failure awaiting acknowledgement.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            QuizState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn answer_for(&self, question: usize) -> Option<usize> {
        self.ledger().and_then(|ledger| ledger.get(question))
    }

    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        let quiz = self.quiz()?;
        let ledger = self.ledger()?;
        Some(Progress {
            answered: ledger.answered_count(),
            total: quiz.len(),
        })
    }

    /// Seconds until generation is allowed again, computed from the clock.
    #[must_use]
    pub fn cooldown_remaining_secs(&self) -> u32 {
        self.cooldown.remaining_secs(self.clock.now())
    }

    /// Recompute the cooldown display value from the clock.
    pub fn tick(&mut self) -> u32 {
        self.cooldown.tick(self.clock.now())
    }

    /// Live once-per-second countdown for the generate button.
    #[must_use]
    pub fn countdown(&self) -> watch::Receiver<u32> {
        self.countdown.subscribe()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Mutable access to the clock, so fixed clocks can be advanced.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    // ─── Session ─────────────────────────────────────────────────────────────

    /// Restore the session from a previously stored token.
    ///
    /// Any attempt in progress is discarded first. A stored token that does
    /// not decode (or has expired) is deleted and the controller stays
    /// signed out.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Storage` if the token store fails.
    pub async fn bootstrap(&mut self) -> Result<Option<&UserSession>, ControllerError> {
        self.drop_session();
        let Some(token) = self.tokens.get().await? else {
            debug!("no stored session");
            return Ok(None);
        };

        match token.decode(self.clock.now()) {
            Ok(user) => {
                info!(user = user.identity(), "restored session");
                self.user = Some(user);
                self.resume_countdown();
            }
            Err(err) => {
                warn!(error = %err, "discarding stored session token");
                self.tokens.clear().await?;
            }
        }
        Ok(self.user.as_ref())
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Transport` if the exchange is rejected and
    /// `ControllerError::Token` if the issued token does not decode.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<&UserSession, ControllerError> {
        let token = self.backend.login(email, password).await?;
        self.establish(token).await
    }

    /// Create an account and sign in to it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`].
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&UserSession, ControllerError> {
        let token = self.backend.signup(name, email, password).await?;
        self.establish(token).await
    }

    /// Sign in with a third-party identity credential.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`].
    pub async fn google_login(&mut self, credential: &str) -> Result<&UserSession, ControllerError> {
        let token = self.backend.google_login(credential).await?;
        self.establish(token).await
    }

    async fn establish(&mut self, token: SessionToken) -> Result<&UserSession, ControllerError> {
        let user = match token.decode(self.clock.now()) {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "auth exchange returned an unusable token");
                self.drop_session();
                self.tokens.clear().await?;
                return Err(err.into());
            }
        };

        self.tokens.set(&token).await?;
        info!(user = user.identity(), "signed in");
        self.state = QuizState::Idle;
        self.resume_countdown();
        Ok(self.user.insert(user))
    }

    /// Sign out from any state, discarding the stored token and the attempt.
    ///
    /// In-memory state is cleared even if the store fails.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Storage` if the token cannot be removed.
    pub async fn logout(&mut self) -> Result<(), ControllerError> {
        self.drop_session();
        self.tokens.clear().await?;
        info!("signed out");
        Ok(())
    }

    fn drop_session(&mut self) {
        self.user = None;
        self.state = QuizState::Idle;
        self.countdown.reset();
    }

    /// The governor outlives sessions; show whatever wait is still left.
    fn resume_countdown(&mut self) {
        let remaining = self.cooldown_remaining_secs();
        if remaining > 0 {
            self.countdown.start(remaining);
        }
    }

    fn require_user(&self) -> Result<(), ControllerError> {
        if self.user.is_none() {
            return Err(ControllerError::NotAuthenticated);
        }
        Ok(())
    }

    // ─── Quiz lifecycle ──────────────────────────────────────────────────────

    /// Request a new quiz at `level`, unless the cooldown is still running.
    ///
    /// Starting a new attempt discards the current one. The cooldown is
    /// charged as soon as the request is allowed, even if it then fails.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, `InvalidState` while a
    /// failure is unacknowledged, `SessionExpired` on a 401, and `Transport`
    /// for other remote failures (the controller is then `Failed`).
    /// After a 401 whose token cannot be removed from the store, `Storage` is
    /// returned instead of `SessionExpired`; the session is dropped either way.
    pub async fn generate(&mut self, level: Level) -> Result<GenerateOutcome, ControllerError> {
        self.require_user()?;
        let phase = self.phase();
        if !matches!(phase, QuizPhase::Idle | QuizPhase::Ready | QuizPhase::Reviewing) {
            return Err(ControllerError::InvalidState {
                action: "generate",
                phase,
            });
        }

        let now = self.clock.now();
        if let CooldownDecision::Throttled { remaining_secs } = self.cooldown.try_begin(now) {
            debug!(remaining_secs, "generation throttled");
            self.countdown.start(remaining_secs);
            return Ok(GenerateOutcome::Throttled { remaining_secs });
        }
        self.countdown.start(self.cooldown.displayed_secs());

        info!(%level, "generating quiz");
        self.state = QuizState::Generating { level };
        let outcome = self.backend.generate_quiz(level).await;
        match outcome {
            Ok(quiz) => {
                debug!(quiz = %quiz.id(), questions = quiz.len(), "quiz ready");
                self.state = QuizState::Ready(Attempt::new(quiz));
                Ok(GenerateOutcome::Ready)
            }
            Err(err) => Err(self.fail(FailedStep::Generation, None, err).await),
        }
    }

    /// Pick `option` for `question`. Picking again replaces the earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, `InvalidState` outside
    /// `Ready`, and `QuestionOutOfRange` / `OptionOutOfRange` for positions
    /// the quiz does not have.
    pub fn record_answer(&mut self, question: usize, option: usize) -> Result<(), ControllerError> {
        self.require_user()?;
        let phase = self.phase();
        let QuizState::Ready(attempt) = &mut self.state else {
            return Err(ControllerError::InvalidState {
                action: "record an answer",
                phase,
            });
        };

        let len = attempt.quiz.len();
        let options = attempt
            .quiz
            .question(question)
            .ok_or(ControllerError::QuestionOutOfRange {
                index: question,
                len,
            })?
            .options()
            .len();
        if option >= options {
            return Err(ControllerError::OptionOutOfRange {
                question,
                option,
                options,
            });
        }

        attempt.ledger.record(question, option);
        Ok(())
    }

    /// Send the answers recorded so far for scoring.
    ///
    /// Unanswered questions are simply left out of the request.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, `InvalidState` outside
    /// `Ready`, `SessionExpired` on a 401, and `Transport` for other remote
    /// failures (the controller is then `Failed`).
    pub async fn submit(&mut self) -> Result<QuizReview, ControllerError> {
        self.require_user()?;
        let attempt = match std::mem::replace(&mut self.state, QuizState::Idle) {
            QuizState::Ready(attempt) => attempt,
            other => {
                let phase = other.phase();
                self.state = other;
                return Err(ControllerError::InvalidState {
                    action: "submit",
                    phase,
                });
            }
        };

        let quiz_id = attempt.quiz.id().clone();
        let answers = attempt.ledger.snapshot();
        info!(quiz = %quiz_id, answered = answers.len(), "submitting quiz");
        self.state = QuizState::Submitting(attempt.clone());

        let outcome = self.backend.submit_quiz(&quiz_id, &answers).await;
        match outcome {
            Ok(result) => {
                info!(quiz = %quiz_id, score = result.score, "quiz scored");
                let review = QuizReview::new(attempt.quiz, result);
                self.state = QuizState::Reviewing(review.clone());
                Ok(review)
            }
            Err(err) => Err(self.fail(FailedStep::Submission, Some(attempt), err).await),
        }
    }

    /// Ask the assistant about one question of the reviewed quiz.
    ///
    /// Has no effect on the quiz state.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, `InvalidState` outside
    /// `Reviewing`, `QuestionOutOfRange` for an unknown question,
    /// `SessionExpired` on a 401, and `Transport` otherwise.
    pub async fn ask_assistant(
        &mut self,
        question_index: usize,
        question: &str,
    ) -> Result<String, ControllerError> {
        self.require_user()?;
        let phase = self.phase();
        let QuizState::Reviewing(review) = &self.state else {
            return Err(ControllerError::InvalidState {
                action: "ask the assistant",
                phase,
            });
        };
        let len = review.quiz().len();
        if question_index >= len {
            return Err(ControllerError::QuestionOutOfRange {
                index: question_index,
                len,
            });
        }
        let quiz_id = review.quiz().id().clone();

        debug!(quiz = %quiz_id, question_index, "asking assistant");
        let outcome = self
            .backend
            .ask_assistant(&quiz_id, question_index, question)
            .await;
        match outcome {
            Ok(answer) => Ok(answer),
            Err(err) if err.is_unauthorized() => Err(self.expire_session(&err).await),
            Err(err) => Err(err.into()),
        }
    }

    /// Dismiss a failure: a failed generation returns to `Idle`, a failed
    /// submission returns to `Ready` with its answers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when nothing has failed.
    pub fn acknowledge_failure(&mut self) -> Result<QuizPhase, ControllerError> {
        match std::mem::replace(&mut self.state, QuizState::Idle) {
            QuizState::Failed { resume, .. } => {
                if let Some(attempt) = resume {
                    self.state = QuizState::Ready(attempt);
                }
                Ok(self.phase())
            }
            other => {
                let phase = other.phase();
                self.state = other;
                Err(ControllerError::InvalidState {
                    action: "acknowledge a failure",
                    phase,
                })
            }
        }
    }

    /// Leave the review screen, discarding the finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` outside `Reviewing`.
    pub fn finish_review(&mut self) -> Result<(), ControllerError> {
        let phase = self.phase();
        if phase != QuizPhase::Reviewing {
            return Err(ControllerError::InvalidState {
                action: "finish the review",
                phase,
            });
        }
        self.state = QuizState::Idle;
        Ok(())
    }

    async fn fail(
        &mut self,
        step: FailedStep,
        resume: Option<Attempt>,
        err: TransportError,
    ) -> ControllerError {
        if err.is_unauthorized() {
            return self.expire_session(&err).await;
        }
        warn!(?step, error = %err, "remote call failed");
        self.state = QuizState::Failed {
            step,
            message: err.to_string(),
            resume,
        };
        err.into()
    }

    /// Sign out after the service rejected the token. The in-memory session
    /// is always dropped; a store that cannot forget the token is reported
    /// as `Storage` so the caller knows it would be restored on next start.
    async fn expire_session(&mut self, err: &TransportError) -> ControllerError {
        warn!(error = %err, "session rejected by service; signing out");
        self.drop_session();
        match self.tokens.clear().await {
            Ok(()) => ControllerError::SessionExpired,
            Err(store_err) => {
                warn!(error = %store_err, "failed to clear rejected session token");
                store_err.into()
            }
        }
    }
}

impl fmt::Debug for QuizSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSessionController")
            .field("user", &self.user)
            .field("phase", &self.phase())
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}
