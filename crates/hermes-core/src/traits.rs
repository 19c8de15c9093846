use std::future::Future;

use crate::error::AppError;
use crate::result::FetchResult;

/// Performs one HTTP request and times it.
///
/// Implementations measure wall-clock duration around the request and return
/// a [`FetchResult`] carrying the observed status code and elapsed time. Any
/// HTTP response, 2xx or not, is an `Ok` outcome with the status recorded;
/// only transport-level failures (connect, DNS, timeout) are errors. The
/// worker converts those into recorded failure outcomes, so a `Fetcher` error
/// never terminates a run.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResult, AppError>> + Send;
}
