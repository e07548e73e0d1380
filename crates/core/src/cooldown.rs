use chrono::{DateTime, Duration, Utc};

/// Minimum spacing between quiz generation attempts, in seconds.
pub const GENERATION_COOLDOWN_SECS: i64 = 60;

/// Answer to "may another generation request go out now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    /// Permission granted; the attempt has been recorded.
    Open,
    /// Still inside the window. Nothing was recorded.
    Throttled { remaining_secs: u32 },
}

/// Client-side throttle in front of the rate-limited generation service.
///
/// An attempt is charged the moment permission is granted, whether or not the
/// remote call later succeeds: the upstream limit counts it either way.
///
/// State lives in memory only, so it resets when the process restarts.
#[derive(Debug, Clone)]
pub struct CooldownGovernor {
    window: Duration,
    last_attempt_at: Option<DateTime<Utc>>,
    remaining_secs: u32,
}

impl Default for CooldownGovernor {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownGovernor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: Duration::seconds(GENERATION_COOLDOWN_SECS),
            last_attempt_at: None,
            remaining_secs: 0,
        }
    }

    #[must_use]
    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempt_at
    }

    /// Time left in the current window, clamped to `[0, window]`.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let Some(last) = self.last_attempt_at else {
            return Duration::zero();
        };
        let left = self.window - (now - last);
        left.clamp(Duration::zero(), self.window)
    }

    /// Whole seconds left, rounded up so "0" only shows once the window is over.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        let millis = self.remaining(now).num_milliseconds();
        let secs = (millis + 999) / 1000;
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_zero()
    }

    /// Asks for permission to start a generation attempt at `now`.
    ///
    /// A refusal has no side effect on the window.
    pub fn try_begin(&mut self, now: DateTime<Utc>) -> CooldownDecision {
        if !self.is_open(now) {
            let remaining_secs = self.tick(now);
            return CooldownDecision::Throttled { remaining_secs };
        }
        self.last_attempt_at = Some(now);
        self.remaining_secs = self.remaining_secs(now);
        CooldownDecision::Open
    }

    /// Recomputes the displayed countdown value.
    pub fn tick(&mut self, now: DateTime<Utc>) -> u32 {
        self.remaining_secs = self.remaining_secs(now);
        self.remaining_secs
    }

    /// Last value computed by `try_begin` or `tick`.
    #[must_use]
    pub fn displayed_secs(&self) -> u32 {
        self.remaining_secs
    }
}
