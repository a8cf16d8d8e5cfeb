// src/report/reporter.rs

use std::sync::{Arc, Mutex, MutexGuard};

use futures::Stream;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::workflow::WorkflowExecution;

/// Append-only log of a run's snapshots.
///
/// The run publishes one full `WorkflowExecution` per state change. Nothing
/// is accepted after the terminal snapshot, so the last entry of a finished
/// run never changes. Subscribers are woken through a `watch` channel
/// carrying the log length.
#[derive(Debug)]
pub struct Reporter {
    log: Mutex<Log>,
    notify: watch::Sender<usize>,
}

#[derive(Debug, Default)]
struct Log {
    snapshots: Vec<Arc<WorkflowExecution>>,
    closed: bool,
}

impl Reporter {
    pub fn new() -> Arc<Self> {
        let (notify, _) = watch::channel(0);
        Arc::new(Self {
            log: Mutex::new(Log::default()),
            notify,
        })
    }

    /// Append a snapshot. Ignored once the run is terminal or closed.
    pub fn publish(&self, snapshot: WorkflowExecution) {
        let len = {
            let mut log = self.lock();
            if log.closed || log.snapshots.last().is_some_and(|s| s.is_terminal()) {
                warn!(
                    workflow = %snapshot.workflow_id,
                    "snapshot published after run finished; dropping"
                );
                return;
            }
            debug!(
                workflow = %snapshot.workflow_id,
                status = ?snapshot.status,
                seq = log.snapshots.len(),
                "publishing snapshot"
            );
            log.snapshots.push(Arc::new(snapshot));
            log.snapshots.len()
        };
        self.notify.send_replace(len);
    }

    /// Stop accepting snapshots and release waiting subscribers.
    pub fn close(&self) {
        let len = {
            let mut log = self.lock();
            log.closed = true;
            log.snapshots.len()
        };
        self.notify.send_replace(len);
    }

    pub fn latest(&self) -> Option<Arc<WorkflowExecution>> {
        self.lock().snapshots.last().cloned()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().snapshots.last().is_some_and(|s| s.is_terminal())
    }

    /// Follow the run from its first snapshot.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        Subscription::new(Arc::clone(self), 0)
    }

    /// Follow the run from its most recent snapshot. A subscriber arriving
    /// after the run finished gets exactly the terminal snapshot.
    pub fn subscribe_latest(self: &Arc<Self>) -> Subscription {
        let cursor = self.lock().snapshots.len().saturating_sub(1);
        Subscription::new(Arc::clone(self), cursor)
    }

    fn get(&self, seq: usize) -> (Option<Arc<WorkflowExecution>>, bool) {
        let log = self.lock();
        (log.snapshots.get(seq).cloned(), log.closed)
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A lazy, finite sequence of snapshots for one run.
///
/// Yields snapshots in publication order and ends right after the terminal
/// one (or when the run closes without one).
#[derive(Debug)]
pub struct Subscription {
    reporter: Arc<Reporter>,
    rx: watch::Receiver<usize>,
    cursor: usize,
    done: bool,
}

impl Subscription {
    fn new(reporter: Arc<Reporter>, cursor: usize) -> Self {
        let rx = reporter.notify.subscribe();
        Self {
            reporter,
            rx,
            cursor,
            done: false,
        }
    }

    /// Wait for the next snapshot.
    pub async fn next(&mut self) -> Option<Arc<WorkflowExecution>> {
        if self.done {
            return None;
        }

        loop {
            // Mark the current version seen before looking at the log so a
            // publish racing with this check still wakes `changed()`.
            let _ = self.rx.borrow_and_update();

            let (snapshot, closed) = self.reporter.get(self.cursor);
            if let Some(snapshot) = snapshot {
                self.cursor += 1;
                if snapshot.is_terminal() {
                    self.done = true;
                }
                return Some(snapshot);
            }

            if closed || self.rx.changed().await.is_err() {
                self.done = true;
                return None;
            }
        }
    }

    /// Adapt into a `futures::Stream`.
    pub fn into_stream(self) -> impl Stream<Item = Arc<WorkflowExecution>> {
        futures::stream::unfold(self, |mut sub| async move {
            let next = sub.next().await?;
            Some((next, sub))
        })
    }

    /// Drain the subscription, returning the last snapshot seen.
    pub async fn last(mut self) -> Option<Arc<WorkflowExecution>> {
        let mut last = None;
        while let Some(snapshot) = self.next().await {
            last = Some(snapshot);
        }
        last
    }
}
