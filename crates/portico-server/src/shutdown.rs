//! Graceful shutdown coordination.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// A cloneable signal that coordinates shutdown across tasks.
///
/// All clones observe the same state: once any of them calls
/// [`trigger`](ShutdownSignal::trigger), every pending and future
/// [`recv`](ShutdownSignal::recv) completes.
///
/// # Example
///
/// ```rust
/// use portico_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let other = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(other.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Triggers shutdown. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when shutdown is triggered. Completes immediately if it
    /// already was.
    pub async fn recv(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Creates a signal wired to SIGTERM and SIGINT.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            tracing::error!("failed to register SIGTERM handler");
            return;
        };
        let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
            tracing::error!("failed to register SIGINT handler");
            return;
        };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C");
        }
    }
}

/// Counts in-flight connections so shutdown can drain them.
#[derive(Debug, Clone)]
pub(crate) struct Drain {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drain {
    pub(crate) fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Registers one connection; dropping the guard deregisters it.
    pub(crate) fn guard(&self) -> DrainGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        DrainGuard {
            active: Arc::clone(&self.active),
            notify: Arc::clone(&self.notify),
        }
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Completes once no connections remain.
    pub(crate) async fn idle(&self) {
        while self.active.load(Ordering::SeqCst) > 0 {
            self.notify.notified().await;
        }
    }
}

#[derive(Debug)]
pub(crate) struct DrainGuard {
    active: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for DrainGuard {
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

    #[test]
    fn test_trigger_is_visible_to_clones() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_shutdown());

        signal.trigger();
        signal.trigger();
        assert!(clone.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_completes_after_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), waiter.recv())
            .await
            .expect("recv should complete");
    }

    #[tokio::test]
    async fn test_recv_completes_immediately_when_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[tokio::test]
    async fn test_drain_counts_guards() {
        let drain = Drain::new();
        assert_eq!(drain.active(), 0);

        let a = drain.guard();
        let b = drain.guard();
        assert_eq!(drain.active(), 2);

        drop(a);
        drop(b);
        assert_eq!(drain.active(), 0);

        tokio::time::timeout(Duration::from_millis(10), drain.idle())
            .await
            .expect("idle should complete with no guards");
    }

    #[tokio::test]
    async fn test_drain_idle_waits_for_last_guard() {
        let drain = Drain::new();
        let guard = drain.guard();

        let waiter = drain.clone();
        let handle = tokio::spawn(async move { waiter.idle().await });

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(guard);
        });

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("idle should complete")
            .expect("task should not panic");
    }
}
