//! Bounded retry with exponential backoff for backend queries
//!
//! The extraction core never retries. The application wraps its backend in
//! [`RetryingBackend`] so that a slow or briefly unavailable server does not
//! abort a long run. Only transient failures are retried.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::warn;

use crate::extraction::traits::AnalysisBackend;
use crate::sonar::error::BackendError;
use crate::sonar::model::{CleanCodeCategory, RawIssue};

/// Configuration for retry behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            max_retries: 4,
        }
    }
}

impl RetryPolicy {
    /// Validate retry configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_delay_ms == 0 {
            return Err("Initial delay must be greater than 0".to_string());
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err("Max delay must be greater than or equal to initial delay".to_string());
        }

        if self.multiplier <= 1.0 {
            return Err("Multiplier must be greater than 1.0".to_string());
        }

        Ok(())
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = (self.initial_delay_ms as f64 * self.multiplier.powi(exponent)) as u64;
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Run `operation` until it succeeds, fails permanently, or retries run out
    pub fn run<T, F>(&self, what: &str, mut operation: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Result<T, BackendError>,
    {
        let mut attempt = 0;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed ({}); retry {}/{} in {:?}",
                        what,
                        error,
                        attempt + 1,
                        self.max_retries,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Backend decorator applying a [`RetryPolicy`] to every query
pub struct RetryingBackend<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: AnalysisBackend> RetryingBackend<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<B: AnalysisBackend> AnalysisBackend for RetryingBackend<B> {
    fn get_measures(
        &self,
        component: &str,
        metric_keys: &[String],
    ) -> Result<HashMap<String, String>, BackendError> {
        self.policy
            .run("Measures query", || self.inner.get_measures(component, metric_keys))
    }

    fn get_issues(&self, category: CleanCodeCategory) -> Result<Vec<RawIssue>, BackendError> {
        self.policy
            .run("Issue search", || self.inner.get_issues(category))
    }
}
