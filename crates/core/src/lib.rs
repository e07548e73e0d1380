#![forbid(unsafe_code)]

pub mod cooldown;
pub mod model;
pub mod session;
pub mod time;

pub use cooldown::{CooldownDecision, CooldownGovernor, GENERATION_COOLDOWN_SECS};
pub use session::{MalformedTokenError, SessionToken};
pub use time::Clock;
