use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Once-per-second countdown feeding the "wait N seconds" display.
///
/// The ticker task stops by itself at zero and is aborted by `stop`, `reset`,
/// a new `start`, or dropping the `Countdown`.
pub struct Countdown {
    display: Arc<watch::Sender<u32>>,
    task: Option<JoinHandle<()>>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        let (display, _) = watch::channel(0);
        Self {
            display: Arc::new(display),
            task: None,
        }
    }

    /// Receiver that observes every change of the displayed value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.display.subscribe()
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        *self.display.borrow()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Show `secs` and count down to zero, replacing any running countdown.
    ///
    /// Outside a Tokio runtime the value is shown but does not tick.
    pub fn start(&mut self, secs: u32) {
        self.stop();
        self.display.send_replace(secs);
        if secs == 0 {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime; countdown will not tick");
            return;
        };

        let display = Arc::clone(&self.display);
        self.task = Some(handle.spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let next = display.borrow().saturating_sub(1);
                display.send_replace(next);
                if next == 0 {
                    break;
                }
            }
        }));
    }

    /// Cancel the ticker, leaving the last shown value in place.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Cancel the ticker and clear the display.
    pub fn reset(&mut self) {
        self.stop();
        self.display.send_replace(0);
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second_and_finishes() {
        let mut countdown = Countdown::new();
        countdown.start(3);
        assert_eq!(countdown.value(), 3);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(countdown.value(), 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(countdown.value(), 0);
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_display_and_releases_task() {
        let mut countdown = Countdown::new();
        countdown.start(10);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        countdown.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.value(), 9);
        assert!(!countdown.is_running());

        countdown.reset();
        assert_eq!(countdown.value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_running_ticker() {
        let mut countdown = Countdown::new();
        let mut rx = countdown.subscribe();
        countdown.start(60);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        countdown.start(5);
        assert_eq!(*rx.borrow_and_update(), 5);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(countdown.value(), 4);
    }

    #[test]
    fn zero_or_no_runtime_does_not_spawn() {
        let mut countdown = Countdown::new();
        countdown.start(0);
        assert!(!countdown.is_running());
        countdown.start(30);
        assert_eq!(countdown.value(), 30);
        assert!(!countdown.is_running());
    }
}
