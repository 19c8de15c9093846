use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::error::AppError;

/// Outcome of one fetch attempt. Immutable once pushed into a [`ResultSink`].
///
/// A transport-level failure leaves `status` empty and records the error
/// message instead; an HTTP response of any status (2xx or not) is recorded
/// with its code.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub url: String,
    pub status: Option<u16>,
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl FetchResult {
    /// A fetch that produced an HTTP response.
    pub fn response(url: impl Into<String>, status: u16, elapsed: Duration) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            error: None,
            elapsed,
        }
    }

    /// A fetch that failed before producing a response.
    pub fn failure(url: impl Into<String>, error: &AppError, elapsed: Duration) -> Self {
        Self {
            url: url.into(),
            status: None,
            error: Some(error.to_string()),
            elapsed,
        }
    }

    /// True if the fetch produced a 2xx response.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

/// Serialize a duration as fractional seconds for the results dump.
fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Shared, append-only collection of fetch results.
///
/// Cloneable handle around a locked `Vec`; workers push concurrently during a
/// run, the dispatcher reads it back once the queue has drained. Append order
/// across workers is not the submission order.
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    inner: Arc<Mutex<Vec<FetchResult>>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: FetchResult) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the results collected so far.
    pub fn snapshot(&self) -> Vec<FetchResult> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consume the sink and return the collected results.
    ///
    /// Avoids the clone when this is the last handle (the dispatcher calls
    /// this after all workers have been awaited).
    pub fn into_results(self) -> Vec<FetchResult> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(arc) => arc
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flag() {
        let ok = FetchResult::response("http://a", 200, Duration::from_millis(5));
        let redirect = FetchResult::response("http://a", 301, Duration::from_millis(5));
        let not_found = FetchResult::response("http://a", 404, Duration::from_millis(5));
        let failed = FetchResult::failure(
            "http://a",
            &AppError::NetworkError("refused".into()),
            Duration::from_millis(5),
        );

        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!not_found.is_success());
        assert!(!failed.is_success());
        assert_eq!(failed.status, None);
        assert!(failed.error.as_deref().unwrap().contains("refused"));
    }

    #[test]
    fn test_elapsed_serializes_as_seconds() {
        let result = FetchResult::response("http://a", 200, Duration::from_millis(1500));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["elapsed"], serde_json::json!(1.5));
        assert_eq!(json["status"], serde_json::json!(200));
    }

    #[test]
    fn test_sink_collects_pushes() {
        let sink = ResultSink::new();
        assert!(sink.is_empty());

        sink.push(FetchResult::response("http://a", 200, Duration::ZERO));
        sink.push(FetchResult::response("http://b", 500, Duration::ZERO));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.snapshot().len(), 2);
        let results = sink.into_results();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_into_results_with_outstanding_clone() {
        let sink = ResultSink::new();
        let handle = sink.clone();
        sink.push(FetchResult::response("http://a", 200, Duration::ZERO));

        // A live clone forces the copying path.
        let results = sink.into_results();
        assert_eq!(results.len(), 1);
        assert_eq!(handle.len(), 1);
    }
}
