//! Polling policy for asynchronous report jobs.
use std::time::Duration;

/// Bounds and pacing for polling a job until it completes.
///
/// The delay between polls starts at `interval` and doubles after every
/// poll, never exceeding `max_interval`. After `max_attempts` polls which
/// report the job as still running, polling gives up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            max_attempts: 120,
        }
    }
}

impl PollPolicy {
    /// Calculates the delay to wait after the provided (zero based) attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.interval
            .checked_mul(factor)
            .map_or(self.max_interval, |delay| delay.min(self.max_interval))
    }
}
