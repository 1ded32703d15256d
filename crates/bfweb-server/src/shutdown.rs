//! Graceful shutdown signal handling.
//!
//! [`ShutdownSignal`] tells the accept loop and every connection task to
//! stop; [`ConnectionTracker`] lets the server wait until the connections it
//! spawned have finished.
//!
//! # Example
//!
//! ```rust,ignore
//! use bfweb_server::ShutdownSignal;
//! use std::time::Duration;
//!
//! let shutdown = ShutdownSignal::new();
//!
//! tokio::select! {
//!     () = shutdown.recv() => println!("Shutdown signal received"),
//!     () = tokio::time::sleep(Duration::from_secs(60)) => println!("Timeout"),
//! }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Notify};

/// A signal that can be used to trigger and await graceful shutdown.
///
/// Clones share state: triggering any clone notifies all of them.
///
/// # Example
///
/// ```rust
/// use bfweb_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let shutdown_clone = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(shutdown_clone.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers the signal. Idempotent.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // No receivers is fine.
            let _ = self.sender.send(());
        }
    }

    /// Returns `true` if shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Returns a future that completes once shutdown is triggered.
    ///
    /// Completes immediately if it already was. The future does not borrow
    /// the signal.
    pub fn recv(&self) -> impl Future<Output = ()> + Send + 'static {
        // Subscribe before reading the flag so a concurrent trigger is seen
        // by one of the two.
        let mut receiver = self.sender.subscribe();
        let triggered = Arc::clone(&self.triggered);

        async move {
            if triggered.load(Ordering::SeqCst) {
                return;
            }
            let _ = receiver.recv().await;
        }
    }

    /// Creates a signal that triggers on SIGTERM or SIGINT (Ctrl+C).
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let signal_clone = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            signal_clone.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for SIGTERM or SIGINT on Unix, Ctrl+C elsewhere.
///
/// If no handler can be installed this never completes, so the server keeps
/// running rather than stopping at once.
async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating graceful shutdown");
                        return;
                    }
                    result = tokio::signal::ctrl_c() => {
                        if result.is_ok() {
                            tracing::info!("Received SIGINT, initiating graceful shutdown");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C, OS signals are ignored");
            std::future::pending::<()>().await;
        }
    }
}

/// Counts live connections so shutdown can wait for them.
///
/// # Example
///
/// ```rust
/// use bfweb_server::shutdown::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
///
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a new connection tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a token to hold for the lifetime of one connection.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until every token has been dropped.
    pub async fn wait_for_shutdown(&self) {
        loop {
            // Register interest before checking, or a drop in between is missed.
            let notified = self.notify.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// A live connection. Dropping it decrements the tracker.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_trigger_is_idempotent_and_shared() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_shutdown());

        signal.trigger();
        signal.trigger();

        assert!(signal.is_shutdown());
        assert!(clone.is_shutdown());
    }

    #[test]
    fn test_recv_pending_until_triggered() {
        let signal = ShutdownSignal::new();
        let mut recv = task::spawn(signal.recv());

        assert_pending!(recv.poll());

        signal.trigger();
        assert!(recv.is_woken());
        assert_ready!(recv.poll());
    }

    #[test]
    fn test_recv_ready_if_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        let mut recv = task::spawn(signal.recv());
        assert_ready!(recv.poll());
    }

    #[tokio::test]
    async fn test_recv_from_another_task() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");
    }

    #[test]
    fn test_tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();
        assert_eq!(tracker.active_connections(), 2);

        drop(first);
        assert_eq!(tracker.active_connections(), 1);
        drop(second);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[test]
    fn test_wait_for_shutdown_immediate_when_idle() {
        let tracker = ConnectionTracker::new();
        let mut wait = task::spawn(tracker.wait_for_shutdown());
        assert_ready!(wait.poll());
    }

    #[test]
    fn test_wait_for_shutdown_wakes_on_last_drop() {
        let tracker = ConnectionTracker::new();
        let first = tracker.acquire();
        let second = tracker.acquire();

        let mut wait = task::spawn(tracker.wait_for_shutdown());
        assert_pending!(wait.poll());

        drop(first);
        assert_pending!(wait.poll());

        drop(second);
        assert!(wait.is_woken());
        assert_ready!(wait.poll());
    }
}
