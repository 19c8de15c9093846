pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod result;
pub mod testutil;
pub mod traits;
pub mod worker;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherConfig};
pub use error::AppError;
pub use queue::WorkQueue;
pub use result::{FetchResult, ResultSink};
pub use traits::Fetcher;
pub use worker::{TracingWorkerReporter, Worker, WorkerEvent, WorkerReporter};
