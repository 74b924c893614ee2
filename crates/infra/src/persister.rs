use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::snapshot::{Snapshot, SnapshotStore};

enum Command {
    Save(Box<Snapshot>),
    Flush(mpsc::Sender<()>),
}

/// Background snapshot writer.
///
/// Every `schedule` replaces the pending snapshot and restarts the idle timer;
/// the worker writes only once no newer snapshot has arrived for `debounce`.
/// Shutdown (or drop) writes whatever is still pending.
#[derive(Debug)]
pub struct DebouncedPersister {
    tx: Option<mpsc::Sender<Command>>,
    join: Option<thread::JoinHandle<()>>,
}

impl DebouncedPersister {
    pub fn spawn(store: Arc<dyn SnapshotStore>, debounce: Duration) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let join = thread::Builder::new()
            .name("snapshot-persister".to_string())
            .spawn(move || persist_loop(&*store, rx, debounce))?;
        Ok(Self {
            tx: Some(tx),
            join: Some(join),
        })
    }

    /// Queue a snapshot for writing.
    pub fn schedule(&self, snapshot: Snapshot) {
        if let Some(tx) = &self.tx {
            if tx.send(Command::Save(Box::new(snapshot))).is_err() {
                tracing::warn!("snapshot persister is gone; snapshot dropped");
            }
        }
    }

    /// Write the pending snapshot now and wait for it.
    pub fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        if tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Flush pending work and stop the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.tx.take());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::warn!("snapshot persister panicked");
            }
        }
    }
}

impl Drop for DebouncedPersister {
    fn drop(&mut self) {
        self.stop();
    }
}

fn persist_loop(store: &dyn SnapshotStore, rx: mpsc::Receiver<Command>, debounce: Duration) {
    let mut pending: Option<Snapshot> = None;

    loop {
        let next = if pending.is_some() {
            rx.recv_timeout(debounce)
        } else {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };

        match next {
            Ok(Command::Save(snapshot)) => pending = Some(*snapshot),
            Ok(Command::Flush(ack)) => {
                write(store, &mut pending);
                let _ = ack.send(());
            }
            Err(RecvTimeoutError::Timeout) => write(store, &mut pending),
            Err(RecvTimeoutError::Disconnected) => {
                write(store, &mut pending);
                break;
            }
        }
    }
}

fn write(store: &dyn SnapshotStore, pending: &mut Option<Snapshot>) {
    if let Some(snapshot) = pending.take() {
        if let Err(err) = store.save(&snapshot) {
            // In-memory state stays authoritative; the next mutation retries.
            tracing::warn!(error = %err, "snapshot write failed");
        }
    }
}
