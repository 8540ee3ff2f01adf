//! Dispatch scheduler - recurring trigger for the dispatch engine

use super::engine::DispatchEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Drives the dispatch engine on a fixed wall-clock interval.
///
/// Explicitly constructed and owned by the composition root; `start()` is
/// idempotent, so a second call while the loop is alive is a no-op. Each pass
/// runs to completion before the next tick is awaited, so passes never
/// overlap. A pass error is logged and the interval continues.
///
/// The scheduler is single-shot: after `shutdown()` it stays stopped, and a
/// new instance must be constructed to run again.
pub struct DispatchScheduler {
    engine: Arc<DispatchEngine>,
    interval: Duration,
    cancel: CancellationToken,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DispatchScheduler {
    pub fn new(engine: Arc<DispatchEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            cancel: CancellationToken::new(),
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Start the recurring dispatch loop. No-op if already started.
    pub fn start(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Dispatch scheduler already running");
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "Dispatch scheduler started");

        let engine = self.engine.clone();
        let cancel = self.cancel.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Dispatch scheduler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match engine.run_pass().await {
                            Ok(summary) => {
                                debug!(
                                    scanned = summary.scanned,
                                    sent = summary.sent,
                                    failed = summary.failed,
                                    "Dispatch pass done"
                                );
                            }
                            Err(e) => {
                                // Keep ticking; the next pass retries the scan
                                error!(error = %e, "Dispatch pass failed");
                            }
                        }
                    }
                }
            }
        });

        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Whether the dispatch loop is currently alive
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the dispatch loop and wait for the in-flight pass to finish
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.cancel.cancel();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
