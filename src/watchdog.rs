// Single-shot command watchdog
// Note: the watchdog is the failsafe for a silent client. If the teleop side hangs
// without closing the socket, nothing else would ever stop the robot.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep, sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Counting down towards the deadline
    Armed,
    /// Deadline passed (or never armed); waits for the next arm
    Expired,
}

/// Deadline timer re-armed on every valid frame
///
/// Each [`Watchdog::arm`] replaces the remaining time with the full timeout.
/// Once expired it stays silent until armed again.
pub struct Watchdog {
    timeout: Duration,
    deadline: Pin<Box<Sleep>>,
    state: WatchdogState,
}

impl Watchdog {
    /// Create a disarmed watchdog
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: Box::pin(sleep(timeout)),
            state: WatchdogState::Expired,
        }
    }

    /// Start (or restart) the countdown from the full timeout
    pub fn arm(&mut self) {
        self.deadline.as_mut().reset(Instant::now() + self.timeout);
        self.state = WatchdogState::Armed;
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deadline of the running countdown, if armed
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            WatchdogState::Armed => Some(self.deadline.deadline()),
            WatchdogState::Expired => None,
        }
    }

    /// Resolves once the armed deadline passes
    ///
    /// Cancel safe: dropping the future leaves the countdown untouched, so it can
    /// be polled from a `select!` loop. Never resolves while expired.
    pub async fn expired(&mut self) {
        if self.state == WatchdogState::Expired {
            pending::<()>().await;
        }
        self.deadline.as_mut().await;
        self.state = WatchdogState::Expired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    const TIMEOUT: Duration = Duration::from_secs(3);

    #[tokio::test(start_paused = true)]
    async fn test_new_watchdog_is_disarmed() {
        let mut watchdog = Watchdog::new(TIMEOUT);
        assert_eq!(watchdog.state(), WatchdogState::Expired);
        assert!(watchdog.deadline().is_none());
        assert!(timeout(TIMEOUT * 10, watchdog.expired()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_timeout() {
        let mut watchdog = Watchdog::new(TIMEOUT);
        let start = Instant::now();
        watchdog.arm();
        assert_eq!(watchdog.state(), WatchdogState::Armed);

        assert!(
            timeout(TIMEOUT - Duration::from_millis(1), watchdog.expired())
                .await
                .is_err()
        );
        assert_eq!(watchdog.state(), WatchdogState::Armed);

        watchdog.expired().await;
        assert_eq!(watchdog.state(), WatchdogState::Expired);
        assert!(start.elapsed() >= TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let mut watchdog = Watchdog::new(TIMEOUT);
        watchdog.arm();
        let first = watchdog.deadline().unwrap();

        advance(Duration::from_secs(2)).await;
        watchdog.arm();
        let second = watchdog.deadline().unwrap();
        assert_eq!(second - first, Duration::from_secs(2));

        // Old deadline is one second away, it must not fire
        assert!(
            timeout(Duration::from_millis(2500), watchdog.expired())
                .await
                .is_err()
        );
        watchdog.expired().await;
        assert!(Instant::now() >= second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stays_quiet_after_expiry_until_armed() {
        let mut watchdog = Watchdog::new(TIMEOUT);
        watchdog.arm();
        watchdog.expired().await;

        assert!(timeout(TIMEOUT * 10, watchdog.expired()).await.is_err());

        watchdog.arm();
        assert!(timeout(TIMEOUT * 2, watchdog.expired()).await.is_ok());
    }
}
