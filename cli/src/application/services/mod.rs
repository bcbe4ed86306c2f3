//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`: never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

use std::time::Duration;

pub mod config_service;
pub mod containers;
pub mod credentials;
pub mod host_config;
pub mod inventory;
pub mod provision;
pub mod registry;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_support;

/// Fixed sleep-and-retry budget for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl PollPolicy {
    /// Total time the loop may sleep.
    #[must_use]
    pub fn budget(self) -> Duration {
        self.interval * self.attempts
    }

    /// Policy covering `max_wait` at `interval`, at least one attempt.
    #[must_use]
    pub fn within(max_wait: Duration, interval: Duration) -> Self {
        let attempts = if interval.is_zero() {
            1
        } else {
            u32::try_from(max_wait.as_millis() / interval.as_millis().max(1))
                .unwrap_or(u32::MAX)
                .max(1)
        };
        Self { interval, attempts }
    }
}
