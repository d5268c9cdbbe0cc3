//! Single-writer, multi-reader "latest value + future stream" cell.
//!
//! [`StateCell`] holds the most recently published value. Every
//! [`Subscription`] first yields the value current at subscription time and
//! then every later publish, in publish order, with nothing skipped.
//! Subscribing and publishing share one lock, so no publish can fall between
//! the snapshot a subscriber starts from and the first update it receives.
//!
//! The cell knows nothing about records or transitions.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

struct Inner<T> {
    latest: Arc<T>,
    version: u64,
    subscribers: Vec<mpsc::UnboundedSender<Arc<T>>>,
    closed: bool,
}

/// Versioned cell that fans every published value out to its subscribers.
pub struct StateCell<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> StateCell<T> {
    /// Create a cell holding `initial` at version 0.
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                latest: initial,
                version: 0,
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// The most recently published value.
    pub fn latest(&self) -> Arc<T> {
        Arc::clone(&self.inner.lock().latest)
    }

    /// Number of values published since creation.
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    /// Whether the cell stopped accepting publishes.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Replace the current value and notify every subscriber.
    ///
    /// Returns the new version, or `None` if the cell is closed.
    pub fn publish(&self, value: Arc<T>) -> Option<u64> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return None;
        }

        inner.latest = Arc::clone(&value);
        inner.version += 1;
        // Dropped subscriptions are pruned here.
        inner
            .subscribers
            .retain(|tx| tx.send(Arc::clone(&value)).is_ok());
        Some(inner.version)
    }

    /// Subscribe to the current value and every later one.
    ///
    /// On a closed cell the subscription yields the final value and ends.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut inner = self.inner.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        if !inner.closed {
            inner.subscribers.push(tx);
        }

        Subscription {
            pending: Some(Arc::clone(&inner.latest)),
            rx,
        }
    }

    /// Stop publishing and end every subscription once drained.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }
}

/// A reader's view of a [`StateCell`].
///
/// Dropping the subscription (or calling
/// [`unsubscribe`](Subscription::unsubscribe)) releases it.
pub struct Subscription<T> {
    pending: Option<Arc<T>>,
    rx: mpsc::UnboundedReceiver<Arc<T>>,
}

impl<T> Subscription<T> {
    /// Wait for the next value.
    ///
    /// The first call returns the value current at subscription time.
    /// Returns `None` once the cell is closed and every published value has
    /// been received.
    pub async fn next(&mut self) -> Option<Arc<T>> {
        if let Some(value) = self.pending.take() {
            return Some(value);
        }
        self.rx.recv().await
    }

    /// Take the next value if one is ready, without waiting.
    pub fn try_next(&mut self) -> Option<Arc<T>> {
        self.pending.take().or_else(|| self.rx.try_recv().ok())
    }

    /// Release the subscription.
    pub fn unsubscribe(self) {}
}

impl<T: Send + Sync + 'static> Subscription<T> {
    /// Adapt the subscription into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Arc<T>> + Send + 'static {
        tokio_stream::iter(self.pending).chain(UnboundedReceiverStream::new(self.rx))
    }
}
