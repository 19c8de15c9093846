use std::time::{Duration, Instant};

use hermes_core::error::AppError;
use hermes_core::result::FetchResult;
use hermes_core::traits::Fetcher;
use reqwest::Client;
use url::Url;

/// HTTP fetcher using reqwest.
///
/// Issues one GET per call, drains the body, and reports the observed status
/// together with the wall-clock time for the whole exchange. Any HTTP
/// response is an `Ok` outcome (a 404 is data, not an error) while
/// transport failures (connect, DNS, timeout) surface as [`AppError`]s for
/// the worker to record.
///
/// No request timeout is applied by default: a hung server stalls that
/// worker until the connection drops. Use [`with_timeout`](Self::with_timeout)
/// to bound individual requests.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: Option<u64>,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::build(None)
    }

    /// Fetcher with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = Client::builder().user_agent("Hermes/0.1 (fetch dispatcher)");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.map(|t| t.as_secs()),
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, AppError> {
        validate_url(url)?;

        let started = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs.unwrap_or_default())
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        // Drain the body so the elapsed time covers the full transfer, not
        // just the response headers.
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        let elapsed = started.elapsed();

        tracing::debug!(%url, %status, bytes = %body.len(), elapsed_ms = %elapsed.as_millis(), "Fetched");

        Ok(FetchResult::response(url, status, elapsed))
    }
}

/// Reject URLs reqwest would choke on mid-flight: unparseable ones,
/// non-HTTP schemes, and host-less forms.
fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::InvalidUrl(format!(
                "scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(AppError::InvalidUrl(format!("{url}: no host")));
    }

    Ok(())
}
