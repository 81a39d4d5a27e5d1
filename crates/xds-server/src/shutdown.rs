//! Graceful shutdown handling for the gateway.
//!
//! On shutdown the listener stops accepting connections and in-flight
//! requests get the configured grace period to finish writing their
//! responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use xds_server::shutdown::ShutdownController;
//! use std::time::Duration;
//!
//! let controller = ShutdownController::new();
//! let signal = controller.shutdown_signal();
//!
//! // Elsewhere
//! controller.shutdown(Duration::from_secs(5)).await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Controller for coordinating graceful shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownController {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug)]
struct ShutdownInner {
    initiated: AtomicBool,
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
    in_flight: AtomicUsize,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    /// Create a new shutdown controller.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            inner: Arc::new(ShutdownInner {
                initiated: AtomicBool::new(false),
                tx,
                rx,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Check if shutdown has been initiated.
    pub fn is_shutdown(&self) -> bool {
        self.inner.initiated.load(Ordering::SeqCst)
    }

    /// Get a future that resolves when shutdown is initiated.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.inner.rx.clone(),
        }
    }

    /// Notify every [`ShutdownSignal`] without waiting.
    ///
    /// Returns `false` if shutdown was already initiated.
    pub fn trigger(&self) -> bool {
        if self
            .inner
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        info!(in_flight = self.in_flight(), "initiating graceful shutdown");
        let _ = self.inner.tx.send(true);
        true
    }

    /// Initiate graceful shutdown.
    ///
    /// Notifies every [`ShutdownSignal`], then waits up to `grace_period` for
    /// in-flight requests to complete. Returns `false` if the grace period
    /// elapsed first.
    pub async fn shutdown(&self, grace_period: Duration) -> bool {
        self.trigger();

        match timeout(grace_period, self.wait_for_completion()).await {
            Ok(()) => {
                info!("graceful shutdown completed");
                true
            }
            Err(_) => {
                warn!(
                    in_flight = self.in_flight(),
                    "grace period elapsed with requests in flight"
                );
                false
            }
        }
    }

    async fn wait_for_completion(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Register an in-flight request.
    ///
    /// Returns a guard that releases the slot when dropped.
    pub fn register_request(&self) -> RequestGuard {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            controller: self.clone(),
        }
    }

    /// Number of requests currently being handled.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }
}

/// Guard for an in-flight request.
#[derive(Debug)]
pub struct RequestGuard {
    controller: ShutdownController,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.controller.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Future that resolves when shutdown is initiated.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for the shutdown signal.
    pub async fn wait(mut self) {
        // A closed channel also means shutdown.
        let _ = self.rx.wait_for(|initiated| *initiated).await;
    }
}

/// Middleware tracking in-flight requests for the shutdown controller.
pub(crate) async fn track_in_flight(
    State(controller): State<ShutdownController>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = controller.register_request();
    next.run(request).await
}

/// Wait for OS shutdown signals (SIGTERM, SIGINT).
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "failed to install signal handlers, falling back to Ctrl+C");
                    ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C"),
        Err(e) => {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_controller_creation() {
        let controller = ShutdownController::new();
        assert!(!controller.is_shutdown());
        assert_eq!(controller.in_flight(), 0);
    }

    #[test]
    fn request_tracking() {
        let controller = ShutdownController::new();

        {
            let _guard1 = controller.register_request();
            let _guard2 = controller.register_request();
            assert_eq!(controller.in_flight(), 2);
        }

        assert_eq!(controller.in_flight(), 0);
    }

    #[tokio::test]
    async fn shutdown_signal_resolves() {
        let controller = ShutdownController::new();
        let signal = controller.shutdown_signal();

        let controller_clone = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller_clone.shutdown(Duration::from_millis(100)).await;
        });

        signal.wait().await;
        assert!(controller.is_shutdown());
    }

    #[tokio::test]
    async fn shutdown_waits_for_requests() {
        let controller = ShutdownController::new();
        let guard = controller.register_request();

        let controller_clone = controller.clone();
        let handle =
            tokio::spawn(async move { controller_clone.shutdown(Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(guard);

        let result = handle.await.expect("shutdown task should complete");
        assert!(result);
    }

    #[test]
    fn trigger_only_once() {
        let controller = ShutdownController::new();
        assert!(controller.trigger());
        assert!(!controller.trigger());
        assert!(controller.is_shutdown());
    }

    #[tokio::test]
    async fn shutdown_times_out() {
        let controller = ShutdownController::new();
        let _guard = controller.register_request();

        assert!(!controller.shutdown(Duration::from_millis(50)).await);
    }
}
