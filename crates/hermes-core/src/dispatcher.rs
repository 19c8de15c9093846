use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::queue::WorkQueue;
use crate::result::{FetchResult, ResultSink};
use crate::traits::Fetcher;
use crate::worker::{TracingWorkerReporter, Worker, WorkerReporter};

/// Default worker pool size when none is configured.
pub const DEFAULT_WORKERS: usize = 8;

/// Configuration for a dispatch run.
///
/// The pool size is fixed and independent of the input size; the dispatcher
/// clamps it to the task count so short inputs don't spawn idle workers.
/// `verbose` gates the per-fetch log line and is an explicit value here
/// rather than an ambient environment lookup.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub verbose: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            verbose: true,
        }
    }
}

impl DispatcherConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of one dispatch run: every collected result plus drain timing.
///
/// `results.len()` equals the number of submitted URLs; ordering across
/// workers is unspecified. The `Display` impl renders the console summary
/// line.
#[derive(Debug)]
pub struct DispatchReport {
    pub results: Vec<FetchResult>,
    pub elapsed: Duration,
    pub workers: usize,
    pub tasks: usize,
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Concurrency: {} workers, Total tasks: {}, Total time: {:.2} secs",
            self.workers,
            self.tasks,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Owns the work queue and a fixed pool of workers for one URL batch.
///
/// Seeds the queue, spawns the pool, waits for the drain barrier, then
/// cancels and awaits every worker before handing back the results.
pub struct Dispatcher<F: Fetcher> {
    fetcher: F,
    config: DispatcherConfig,
    reporter: Arc<dyn WorkerReporter>,
}

impl<F: Fetcher + 'static> Dispatcher<F> {
    pub fn new(fetcher: F, config: DispatcherConfig) -> Self {
        let reporter = Arc::new(TracingWorkerReporter::new(config.verbose));
        Self {
            fetcher,
            config,
            reporter,
        }
    }

    /// Replace the default tracing reporter (e.g. for tests).
    pub fn with_reporter(mut self, reporter: Arc<dyn WorkerReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Fetch every URL through the worker pool and return the collected
    /// results together with the total drain time.
    ///
    /// Duplicates are allowed and fetched independently. Returns only after
    /// every URL has produced exactly one result and every worker has shut
    /// down; an empty input returns immediately with an empty report.
    pub async fn dispatch(&self, urls: Vec<String>) -> DispatchReport {
        let tasks = urls.len();
        // At least one worker whenever there is work, or join would never
        // resolve; never more workers than tasks.
        let workers = self.config.workers.max(1).min(tasks);
        let run_id = short_run_id();

        let queue = Arc::new(WorkQueue::new());
        for url in urls {
            queue.enqueue(url);
        }

        let sink = ResultSink::new();
        let cancel_token = CancellationToken::new();

        tracing::debug!(%run_id, %workers, %tasks, "Dispatch started");
        let started = Instant::now();

        let mut handles = Vec::with_capacity(workers);
        for i in 1..=workers {
            let worker = Worker::new(
                format!("worker-{i}"),
                Arc::clone(&queue),
                self.fetcher.clone(),
                sink.clone(),
                Arc::clone(&self.reporter),
            );
            let token = cancel_token.child_token();
            handles.push(tokio::spawn(async move { worker.run(token).await }));
        }

        queue.join().await;
        let elapsed = started.elapsed();

        // Drain is complete; cancellation just releases the idle workers.
        cancel_token.cancel();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(%run_id, error = %e, "Worker task panicked");
            }
        }

        tracing::debug!(
            %run_id,
            elapsed_ms = %elapsed.as_millis(),
            results = %sink.len(),
            "Dispatch complete"
        );

        DispatchReport {
            results: sink.into_results(),
            elapsed,
            workers,
            tasks,
        }
    }
}

/// Short unique id for correlating one dispatch run in the logs.
fn short_run_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::testutil::MockFetcher;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn quiet_config() -> DispatcherConfig {
        DispatcherConfig::default().with_verbose(false)
    }

    #[tokio::test]
    async fn result_count_matches_input_count() {
        for n in [0usize, 1, 3, 17] {
            let input: Vec<String> = (0..n).map(|i| format!("http://host/{i}")).collect();
            let dispatcher = Dispatcher::new(MockFetcher::with_status(200), quiet_config());
            let report = dispatcher.dispatch(input).await;
            assert_eq!(report.results.len(), n);
            assert_eq!(report.tasks, n);
        }
    }

    #[tokio::test]
    async fn empty_input_completes_without_deadlock() {
        let dispatcher = Dispatcher::new(MockFetcher::with_status(200), quiet_config());
        let report = tokio::time::timeout(Duration::from_millis(200), dispatcher.dispatch(vec![]))
            .await
            .expect("empty dispatch must not block");
        assert!(report.results.is_empty());
        assert_eq!(report.workers, 0);
    }

    #[tokio::test]
    async fn single_url_success() {
        let dispatcher = Dispatcher::new(MockFetcher::with_status(200), quiet_config());
        let report = dispatcher.dispatch(urls(&["http://example.com"])).await;

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.url, "http://example.com");
        assert_eq!(result.status, Some(200));
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn duplicate_urls_are_fetched_independently() {
        let dispatcher = Dispatcher::new(
            MockFetcher::with_status(200).with_delay(Duration::from_millis(5)),
            quiet_config(),
        );
        let report = dispatcher.dispatch(urls(&["http://a", "http://a", "http://a"])).await;

        assert_eq!(report.results.len(), 3);
        for result in &report.results {
            assert_eq!(result.url, "http://a");
            assert!(result.elapsed >= Duration::from_millis(5));
        }
    }

    #[tokio::test]
    async fn failing_fetcher_still_completes_with_full_count() {
        let dispatcher =
            Dispatcher::new(MockFetcher::always_failing("dns failure"), quiet_config());
        let report = dispatcher
            .dispatch(urls(&["http://a", "http://b", "http://c"]))
            .await;

        assert_eq!(report.results.len(), 3);
        for result in &report.results {
            assert_eq!(result.status, None);
            assert!(result.error.as_deref().unwrap().contains("dns failure"));
        }
    }

    #[tokio::test]
    async fn mixed_outcomes_are_all_recorded() {
        let fetcher = MockFetcher::with_outcomes(vec![
            Ok(200),
            Err(AppError::Timeout(30)),
            Ok(404),
        ]);
        let dispatcher = Dispatcher::new(fetcher, quiet_config().with_workers(1));
        let report = dispatcher
            .dispatch(urls(&["http://a", "http://b", "http://c"]))
            .await;

        assert_eq!(report.results.len(), 3);
        let statuses: Vec<Option<u16>> = report.results.iter().map(|r| r.status).collect();
        assert!(statuses.contains(&Some(200)));
        assert!(statuses.contains(&Some(404)));
        assert!(statuses.contains(&None));
    }

    #[tokio::test]
    async fn fetches_run_concurrently_not_serially() {
        let delay = Duration::from_millis(100);
        let input: Vec<String> = (0..8).map(|i| format!("http://host/{i}")).collect();
        let dispatcher = Dispatcher::new(
            MockFetcher::with_status(200).with_delay(delay),
            quiet_config().with_workers(8),
        );

        let report = dispatcher.dispatch(input).await;

        assert_eq!(report.results.len(), 8);
        assert!(report.elapsed >= delay);
        // Serial execution would take ~800ms; allow generous scheduler slack.
        assert!(
            report.elapsed < delay * 4,
            "expected parallel execution, elapsed: {:?}",
            report.elapsed
        );
    }

    #[tokio::test]
    async fn pool_is_clamped_to_task_count() {
        let dispatcher = Dispatcher::new(
            MockFetcher::with_status(200),
            quiet_config().with_workers(16),
        );
        let report = dispatcher.dispatch(urls(&["http://a", "http://b"])).await;
        assert_eq!(report.workers, 2);
    }

    #[tokio::test]
    async fn small_pool_still_drains_larger_input() {
        let input: Vec<String> = (0..10).map(|i| format!("http://host/{i}")).collect();
        let dispatcher = Dispatcher::new(
            MockFetcher::with_status(200),
            quiet_config().with_workers(2),
        );
        let report = dispatcher.dispatch(input).await;

        assert_eq!(report.workers, 2);
        assert_eq!(report.results.len(), 10);
    }

    #[tokio::test]
    async fn zero_worker_config_still_drains() {
        let dispatcher = Dispatcher::new(
            MockFetcher::with_status(200),
            quiet_config().with_workers(0),
        );
        let report = dispatcher.dispatch(urls(&["http://a", "http://b"])).await;
        assert_eq!(report.workers, 1);
        assert_eq!(report.results.len(), 2);
    }

    #[tokio::test]
    async fn custom_reporter_sees_one_fetch_per_task() {
        use std::sync::Mutex;

        use crate::worker::{WorkerEvent, WorkerReporter};

        #[derive(Default)]
        struct CountingReporter {
            fetches: Mutex<usize>,
        }

        impl WorkerReporter for CountingReporter {
            fn report(&self, event: WorkerEvent<'_>) {
                if matches!(event, WorkerEvent::Fetching { .. }) {
                    *self.fetches.lock().unwrap() += 1;
                }
            }
        }

        let reporter = Arc::new(CountingReporter::default());
        let dispatcher = Dispatcher::new(MockFetcher::with_status(200), quiet_config())
            .with_reporter(reporter.clone());
        let report = dispatcher
            .dispatch(urls(&["http://a", "http://b", "http://c"]))
            .await;

        assert_eq!(report.results.len(), 3);
        assert_eq!(*reporter.fetches.lock().unwrap(), 3);
    }

    #[test]
    fn report_summary_formats_elapsed_to_two_decimals() {
        let report = DispatchReport {
            results: vec![],
            elapsed: Duration::from_millis(1234),
            workers: 4,
            tasks: 9,
        };
        assert_eq!(
            report.to_string(),
            "Concurrency: 4 workers, Total tasks: 9, Total time: 1.23 secs"
        );
    }
}
