//! Shutdown coordination for the node.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit status used by `-crash`.
pub const CRASH_EXIT_CODE: i32 = 2;

/// Process-level stop requests raised by directives.
pub trait ShutdownCoordinator: Send + Sync {
    /// Stop accepting connections and let in-flight requests drain.
    fn request_graceful_stop(&self);

    /// End the process now.
    fn terminate_immediately(&self);
}

/// Coordinator for graceful shutdown.
///
/// Every listener waits on [`Shutdown::stopped`]; triggering is sticky, so a
/// listener that subscribes late still sees it.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been triggered.
    pub fn stopped(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        let triggered = self.triggered.clone();
        async move {
            if triggered.load(Ordering::SeqCst) {
                return;
            }
            let _ = rx.recv().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator for Shutdown {
    fn request_graceful_stop(&self) {
        tracing::info!("Graceful stop requested");
        self.trigger();
    }

    fn terminate_immediately(&self) {
        tracing::error!(code = CRASH_EXIT_CODE, "Crash requested, terminating");
        std::process::exit(CRASH_EXIT_CODE);
    }
}

/// Ignores every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopShutdown;

impl ShutdownCoordinator for NoopShutdown {
    fn request_graceful_stop(&self) {}

    fn terminate_immediately(&self) {}
}

/// Counts requests instead of acting on them.
#[derive(Debug, Default)]
pub struct RecordingShutdown {
    graceful: AtomicUsize,
    terminate: AtomicUsize,
}

impl RecordingShutdown {
    pub fn graceful_stops(&self) -> usize {
        self.graceful.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> usize {
        self.terminate.load(Ordering::SeqCst)
    }
}

impl ShutdownCoordinator for RecordingShutdown {
    fn request_graceful_stop(&self) {
        self.graceful.fetch_add(1, Ordering::SeqCst);
    }

    fn terminate_immediately(&self) {
        self.terminate.fetch_add(1, Ordering::SeqCst);
    }
}
