//! Concurrent work queue with a drain barrier.
//!
//! Mirrors the classic producer-consumer queue contract: producers `enqueue`
//! without blocking, consumers suspend on `dequeue` until an item is
//! available, and `join` suspends until every enqueued item has been both
//! dequeued and marked done via `mark_done`.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::{Notify, watch};

/// Unbounded FIFO of work items shared between a dispatcher and its workers.
///
/// Each item is delivered to exactly one consumer. The outstanding count
/// (enqueued minus done) backs the [`join`](Self::join) barrier and is kept
/// in a `watch` channel so joiners observe every transition race-free.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    item_ready: Notify,
    outstanding: watch::Sender<usize>,
}

impl<T: Send> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            item_ready: Notify::new(),
            outstanding: watch::Sender::new(0),
        }
    }

    /// Add an item to the queue. Never blocks.
    pub fn enqueue(&self, item: T) {
        // Bump the outstanding count before the item becomes visible so the
        // done count can never overtake the enqueued count.
        self.outstanding.send_modify(|n| *n += 1);
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self.item_ready.notify_one();
    }

    /// Remove and return the next item, suspending until one is available.
    ///
    /// Cancel-safe: dropping the future (e.g. from a `select!` arm) never
    /// loses an item already handed out, so callers race it against a
    /// cancellation signal.
    pub async fn dequeue(&self) -> T {
        loop {
            // Register interest before checking, so an enqueue landing
            // between the check and the await still wakes us.
            let notified = self.item_ready.notified();
            if let Some(item) = self
                .items
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
            {
                return item;
            }
            notified.await;
        }
    }

    /// Record that work on one dequeued item has finished.
    ///
    /// # Panics
    ///
    /// Panics if called more times than items were enqueued. That is a
    /// bookkeeping bug in the caller, not a runtime condition.
    pub fn mark_done(&self) {
        self.outstanding.send_modify(|n| {
            *n = n
                .checked_sub(1)
                .expect("mark_done called with no outstanding work items");
        });
    }

    /// Number of items enqueued but not yet marked done.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Suspend until every enqueued item has been marked done.
    ///
    /// Returns immediately when nothing is outstanding, so an empty run can
    /// never deadlock here.
    pub async fn join(&self) {
        let mut rx = self.outstanding.subscribe();
        while *rx.borrow_and_update() != 0 {
            // The sender lives in `self`, so the channel stays open for the
            // lifetime of this borrow; a closed channel just ends the wait.
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

impl<T: Send> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
