//! Background persistence worker.
//!
//! One thread owns the write connection and drains a channel of typed
//! requests; the event loop only enqueues and never waits on storage.
//! Failures come back as values on a separate error channel so the UI can
//! show a banner without interrupting the session.

use crate::session::SessionRecord;
use crate::storage::{AggregateStats, SessionDb, StorageError};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

/// A unit of durable work. `StatsAndSession` must commit or roll back as
/// one transaction.
#[derive(Debug)]
pub enum PersistRequest {
    UpdateStats(AggregateStats),
    InsertSession(SessionRecord),
    StatsAndSession(AggregateStats, SessionRecord),
}

/// Handle held by the event loop. Dropping it (or calling [`shutdown`])
/// closes the request channel; the worker drains everything already
/// enqueued before exiting, so nothing accepted is silently lost.
///
/// [`shutdown`]: PersistHandle::shutdown
#[derive(Debug)]
pub struct PersistHandle {
    tx: Option<Sender<PersistRequest>>,
    err_rx: Receiver<StorageError>,
    worker: Option<JoinHandle<()>>,
}

impl PersistHandle {
    /// Spawns the worker thread around its exclusive write connection.
    pub fn spawn(db: SessionDb) -> Self {
        let (tx, rx) = mpsc::channel::<PersistRequest>();
        let (err_tx, err_rx) = mpsc::channel::<StorageError>();

        let worker = thread::spawn(move || {
            let mut db = db;
            // iteration ends once all senders are gone and the queue is dry
            for request in rx {
                let result = match request {
                    PersistRequest::UpdateStats(stats) => db.update_aggregate_stats(&stats),
                    PersistRequest::InsertSession(record) => db.insert_session(&record),
                    PersistRequest::StatsAndSession(stats, record) => {
                        db.save_stats_and_session(&stats, &record)
                    }
                };
                if let Err(err) = result {
                    if err_tx.send(err).is_err() {
                        break;
                    }
                }
            }
        });

        Self {
            tx: Some(tx),
            err_rx,
            worker: Some(worker),
        }
    }

    /// Fire-and-forget enqueue. A closed channel means the worker is gone,
    /// which only happens during shutdown; the request is dropped then.
    pub fn enqueue(&self, request: PersistRequest) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(request);
        }
    }

    /// Non-blocking poll of the error channel.
    pub fn poll_error(&self) -> Option<StorageError> {
        match self.err_rx.try_recv() {
            Ok(err) => Some(err),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Closes the queue and waits for the worker to drain it.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for PersistHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
