use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::queue::WorkQueue;
use crate::result::{FetchResult, ResultSink};
use crate::traits::Fetcher;

/// Events emitted by a worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started {
        worker_id: &'a str,
    },
    Fetching {
        worker_id: &'a str,
        url: &'a str,
    },
    Fetched {
        worker_id: &'a str,
        url: &'a str,
        status: u16,
        elapsed: Duration,
    },
    FetchFailed {
        worker_id: &'a str,
        url: &'a str,
        error: &'a str,
    },
    Stopped {
        worker_id: &'a str,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
///
/// The per-fetch `Fetching` line is emitted at info level only when verbose
/// is set; everything else keeps its level regardless.
#[derive(Debug, Clone, Copy)]
pub struct TracingWorkerReporter {
    verbose: bool,
}

impl TracingWorkerReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Default for TracingWorkerReporter {
    fn default() -> Self {
        Self { verbose: true }
    }
}

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started { worker_id } => {
                tracing::debug!(%worker_id, "Worker started");
            }
            WorkerEvent::Fetching { worker_id, url } => {
                if self.verbose {
                    tracing::info!(%worker_id, %url, "Fetching");
                } else {
                    tracing::debug!(%worker_id, %url, "Fetching");
                }
            }
            WorkerEvent::Fetched {
                worker_id,
                url,
                status,
                elapsed,
            } => {
                tracing::debug!(%worker_id, %url, %status, elapsed_ms = %elapsed.as_millis(), "Fetched");
            }
            WorkerEvent::FetchFailed {
                worker_id,
                url,
                error,
            } => {
                tracing::warn!(%worker_id, %url, %error, "Fetch failed");
            }
            WorkerEvent::Stopped { worker_id } => {
                tracing::debug!(%worker_id, "Worker stopped");
            }
        }
    }
}

/// Worker that drains URLs from the queue and records fetch outcomes.
///
/// Runs until cancelled. A fetcher error is converted into a recorded failure
/// outcome, never into loop termination, and `mark_done` is called for every
/// dequeued item regardless of how the fetch went.
pub struct Worker<F: Fetcher> {
    id: String,
    queue: Arc<WorkQueue<String>>,
    fetcher: F,
    sink: ResultSink,
    reporter: Arc<dyn WorkerReporter>,
}

impl<F: Fetcher> Worker<F> {
    pub fn new(
        id: impl Into<String>,
        queue: Arc<WorkQueue<String>>,
        fetcher: F,
        sink: ResultSink,
        reporter: Arc<dyn WorkerReporter>,
    ) -> Self {
        Self {
            id: id.into(),
            queue,
            fetcher,
            sink,
            reporter,
        }
    }

    /// Run the dequeue/fetch/record loop until cancellation.
    ///
    /// Cancellation is cooperative: it interrupts a pending `dequeue` but an
    /// in-flight fetch finishes its cycle (record + `mark_done`) before the
    /// token is checked again.
    pub async fn run(&self, cancel_token: CancellationToken) {
        self.reporter
            .report(WorkerEvent::Started { worker_id: &self.id });

        loop {
            let url = tokio::select! {
                url = self.queue.dequeue() => url,
                () = cancel_token.cancelled() => break,
            };

            self.reporter.report(WorkerEvent::Fetching {
                worker_id: &self.id,
                url: &url,
            });

            let started = Instant::now();
            let result = match self.fetcher.fetch(&url).await {
                Ok(result) => {
                    self.reporter.report(WorkerEvent::Fetched {
                        worker_id: &self.id,
                        url: &url,
                        status: result.status.unwrap_or_default(),
                        elapsed: result.elapsed,
                    });
                    result
                }
                Err(e) => {
                    let message = e.to_string();
                    self.reporter.report(WorkerEvent::FetchFailed {
                        worker_id: &self.id,
                        url: &url,
                        error: &message,
                    });
                    // The fetcher never timed the failed attempt, so measure
                    // it here.
                    FetchResult::failure(url, &e, started.elapsed())
                }
            };

            self.sink.push(result);
            self.queue.mark_done();
        }

        self.reporter
            .report(WorkerEvent::Stopped { worker_id: &self.id });
    }
}
