use chrono::{DateTime, Duration, Utc};

/// Where "now" comes from for cooldown windows and token expiry.
///
/// Tests use `Frozen` and step it with [`Clock::advance`] rather than sleep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Frozen(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn frozen_at(at: DateTime<Utc>) -> Self {
        Self::Frozen(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Frozen(at) => *at,
        }
    }

    /// Step a frozen clock forward. No-op on the system clock.
    pub fn advance(&mut self, by: Duration) {
        if let Clock::Frozen(at) = self {
            *at += by;
        }
    }
}

/// 2023-11-14T22:13:20Z, a stable "now" for tests.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_700_000_000)
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::frozen_at(fixed_now())
}
