//! Test utilities: a mock `Fetcher` for dependency injection in unit tests.
//!
//! Handwritten, `Arc<Mutex<_>>`-backed like the rest of the crate's shared
//! state. Supports scripted per-call outcomes, an always-failing mode, and a
//! configurable artificial delay for timing-sensitive tests.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::result::FetchResult;
use crate::traits::Fetcher;

/// Mock fetcher with scripted outcomes.
///
/// Each call pops the next scripted outcome; once the script is exhausted
/// (or was never provided) every call returns the default status. The
/// optional delay is awaited before the outcome is produced, so the recorded
/// elapsed time reflects it.
#[derive(Clone)]
pub struct MockFetcher {
    outcomes: Arc<Mutex<Vec<Result<u16, AppError>>>>,
    fail_all: Option<String>,
    default_status: u16,
    delay: Duration,
}

impl MockFetcher {
    /// Every call responds with the given status.
    pub fn with_status(status: u16) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            fail_all: None,
            default_status: status,
            delay: Duration::ZERO,
        }
    }

    /// Scripted outcomes, consumed one per call; falls back to 200 after.
    pub fn with_outcomes(outcomes: Vec<Result<u16, AppError>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes)),
            fail_all: None,
            default_status: 200,
            delay: Duration::ZERO,
        }
    }

    /// Every call fails with a network error carrying the given message.
    pub fn always_failing(message: impl Into<String>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            fail_all: Some(message.into()),
            default_status: 200,
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` inside every fetch, to simulate network latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, AppError> {
        let started = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(message) = &self.fail_all {
            return Err(AppError::NetworkError(message.clone()));
        }

        let next = {
            let mut outcomes = self.outcomes.lock().unwrap_or_else(PoisonError::into_inner);
            if outcomes.is_empty() {
                Ok(self.default_status)
            } else {
                outcomes.remove(0)
            }
        };

        match next {
            Ok(status) => Ok(FetchResult::response(url, status, started.elapsed())),
            Err(e) => Err(e),
        }
    }
}
