//! Background execution of sync operations.
//!
//! The engine blocks on device I/O, so the runner moves each operation
//! onto tokio's blocking pool and reports progress over a channel. Only one
//! operation may be in flight at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::types::{SyncEvent, SyncReport, SyncRequest};

/// Clears the busy flag when the blocking task ends, however it ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs one sync at a time off the async executor.
pub struct SyncRunner {
    engine: Arc<SyncEngine>,
    busy: Arc<AtomicBool>,
    events_tx: mpsc::Sender<SyncEvent>,
    events_rx: Option<mpsc::Receiver<SyncEvent>>,
    cancel: CancellationToken,
}

impl SyncRunner {
    /// Wraps `engine`, replacing its event channel and cancellation token.
    pub fn new(engine: SyncEngine) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();
        let engine = engine
            .with_cancel(cancel.clone())
            .with_events(events_tx.clone());
        Self {
            engine: Arc::new(engine),
            busy: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx: Some(events_rx),
            cancel,
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SyncEvent>> {
        self.events_rx.take()
    }

    /// Cancelling stops the running operation at the next file boundary
    /// and rejects every later one.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Runs `request` on the blocking pool.
    ///
    /// Fails with [`SyncError::Busy`] while another operation is running.
    /// Dropping the returned future does not stop the operation; use the
    /// cancellation token.
    pub async fn run(&self, request: SyncRequest) -> Result<SyncReport, SyncError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::Busy);
        }
        let guard = BusyGuard(self.busy.clone());

        let direction = request.direction;
        let game_name = request.game.name.clone();
        let engine = self.engine.clone();
        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            engine.run(&request)
        })
        .await
        .unwrap_or_else(|e| Err(SyncError::Worker(e.to_string())));

        match &result {
            Ok(report) => {
                self.emit(SyncEvent::Completed {
                    direction,
                    game_name: game_name.clone(),
                    files: report.files.len(),
                });
                info!(%direction, game = %game_name, "sync completed");
            }
            Err(e) => {
                let err_msg = e.to_string();
                self.emit(SyncEvent::Failed {
                    direction,
                    game_name: game_name.clone(),
                    error: err_msg.clone(),
                });
                error!(%direction, game = %game_name, error = %err_msg, "sync failed");
            }
        }
        result
    }

    /// Never waits: nobody may be reading the events.
    fn emit(&self, event: SyncEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            debug!(error = %e, "sync event dropped");
        }
    }
}
