//! Notification controller.
//!
//! One message slot per screen. A new message replaces the visible one and restarts
//! the dismissal timer; nothing is queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Whether the message reports a success or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: Level,
}

struct Inner {
    tx: watch::Sender<Option<Notification>>,
    generation: AtomicU64,
    duration: Duration,
}

/// Single-slot, auto-dismissing notification bubble.
///
/// Cloning yields a handle to the same slot.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                tx,
                generation: AtomicU64::new(0),
                duration,
            }),
        }
    }

    /// Show a success/info message.
    pub fn notify(&self, message: impl Into<String>) {
        self.show(message.into(), Level::Info);
    }

    /// Show a failure message.
    pub fn notify_error(&self, message: impl Into<String>) {
        self.show(message.into(), Level::Error);
    }

    fn show(&self, message: String, level: Level) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(%message, ?level, "Notification shown");
        self.inner
            .tx
            .send_replace(Some(Notification { message, level }));

        // Only the timer of the latest message may clear the slot.
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.duration).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.tx.send_replace(None);
            }
        });
    }

    /// Clear the slot immediately.
    pub fn dismiss(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.tx.send_replace(None);
    }

    /// The visible message, if any.
    pub fn current(&self) -> Option<Notification> {
        self.inner.tx.borrow().clone()
    }

    /// Watch the slot for changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.tx.subscribe()
    }
}
