//! Reconnect backoff.

use std::time::Duration;

/// Delay before the first reconnect, and after every successful open.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Upper bound for the reconnect delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(30_000);

/// Exponential reconnect delay, doubled after each wait and capped.
///
/// [`advance`](Self::advance) hands out the current delay and only then
/// doubles it, so the first retry waits exactly the initial delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl RetryBackoff {
    /// Create a backoff starting at `initial`, never exceeding `max`.
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// The delay the next wait will use.
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// The configured cap.
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Return to the initial delay.
    pub const fn reset(&mut self) {
        self.current = self.initial;
    }

    /// Take the delay for this wait, then double the stored delay.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(INITIAL_RETRY_DELAY, MAX_RETRY_DELAY)
    }
}

/// Render a delay in seconds: `1000ms` as `1`, `1500ms` as `1.5`.
pub fn format_seconds(delay: Duration) -> String {
    let millis = delay.as_millis();
    let whole = millis / 1000;
    let frac = millis % 1000;
    if frac == 0 {
        return whole.to_string();
    }
    let mut text = format!("{whole}.{frac:03}");
    while text.ends_with('0') {
        text.pop();
    }
    text
}
