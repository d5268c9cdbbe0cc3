//! The ordered inbox feeding the updater.
//!
//! [`Dispatcher`] is the producer side: cheap to clone, never blocks, and
//! hands events to a single FIFO channel. Every accepted event yields exactly
//! one transition attempt, in the order it was accepted.

use crate::core::{Record, TransitionError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Why an event did not produce a published record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The store is closed or its updater has halted.
    #[error("store is closed")]
    Closed,

    /// A bounded inbox was full when the event arrived.
    #[error("inbox is full (capacity {capacity})")]
    InboxFull { capacity: usize },

    /// The event was processed but its transition failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

type Reply<R> = oneshot::Sender<Result<Arc<R>, TransitionError>>;

/// An event waiting in the inbox.
pub(crate) struct Envelope<R: Record> {
    pub(crate) event: R::Event,
    pub(crate) reply: Option<Reply<R>>,
}

enum InboxSender<R: Record> {
    Unbounded(mpsc::UnboundedSender<Envelope<R>>),
    Bounded {
        tx: mpsc::Sender<Envelope<R>>,
        capacity: usize,
    },
}

impl<R: Record> Clone for InboxSender<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Unbounded(tx) => Self::Unbounded(tx.clone()),
            Self::Bounded { tx, capacity } => Self::Bounded {
                tx: tx.clone(),
                capacity: *capacity,
            },
        }
    }
}

/// Consumer side of the inbox, owned by the updater.
pub(crate) enum InboxReceiver<R: Record> {
    Unbounded(mpsc::UnboundedReceiver<Envelope<R>>),
    Bounded(mpsc::Receiver<Envelope<R>>),
}

impl<R: Record> InboxReceiver<R> {
    pub(crate) async fn recv(&mut self) -> Option<Envelope<R>> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}

/// Create an inbox. `None` means unbounded.
///
/// The capacity must be non-zero; callers validate it beforehand.
pub(crate) fn inbox<R: Record>(capacity: Option<usize>) -> (Dispatcher<R>, InboxReceiver<R>) {
    let (sender, receiver) = match capacity {
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (InboxSender::Unbounded(tx), InboxReceiver::Unbounded(rx))
        }
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                InboxSender::Bounded { tx, capacity },
                InboxReceiver::Bounded(rx),
            )
        }
    };
    (Dispatcher { inbox: sender }, receiver)
}

/// Handle for submitting events to a store.
///
/// Handed to reactions so they can feed further events back into the same
/// inbox as external producers.
pub struct Dispatcher<R: Record> {
    inbox: InboxSender<R>,
}

impl<R: Record> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            inbox: self.inbox.clone(),
        }
    }
}

impl<R: Record> fmt::Debug for Dispatcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<R: Record> Dispatcher<R> {
    /// Enqueue `event` and return immediately.
    ///
    /// Rejections are logged, not returned; use
    /// [`try_dispatch`](Self::try_dispatch) to observe them.
    pub fn dispatch(&self, event: R::Event) {
        match self.try_dispatch(event) {
            Ok(()) => {}
            Err(DispatchError::InboxFull { capacity }) => {
                tracing::warn!(capacity, "inbox full, event dropped");
            }
            Err(error) => {
                tracing::debug!(%error, "event dropped");
            }
        }
    }

    /// Enqueue `event`, reporting whether it was accepted.
    pub fn try_dispatch(&self, event: R::Event) -> Result<(), DispatchError> {
        self.enqueue(Envelope { event, reply: None })
    }

    /// Enqueue `event` and get a [`Receipt`] for its outcome.
    pub fn send(&self, event: R::Event) -> Receipt<R> {
        let (tx, rx) = oneshot::channel();
        let envelope = Envelope {
            event,
            reply: Some(tx),
        };
        match self.enqueue(envelope) {
            Ok(()) => Receipt {
                state: ReceiptState::Pending(rx),
            },
            Err(error) => Receipt {
                state: ReceiptState::Rejected(error),
            },
        }
    }

    /// Whether the updater has stopped receiving.
    pub fn is_closed(&self) -> bool {
        match &self.inbox {
            InboxSender::Unbounded(tx) => tx.is_closed(),
            InboxSender::Bounded { tx, .. } => tx.is_closed(),
        }
    }

    fn enqueue(&self, envelope: Envelope<R>) -> Result<(), DispatchError> {
        match &self.inbox {
            InboxSender::Unbounded(tx) => tx.send(envelope).map_err(|_| DispatchError::Closed),
            InboxSender::Bounded { tx, capacity } => tx.try_send(envelope).map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => DispatchError::InboxFull {
                    capacity: *capacity,
                },
                mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
            }),
        }
    }
}

enum ReceiptState<R> {
    Pending(oneshot::Receiver<Result<Arc<R>, TransitionError>>),
    Rejected(DispatchError),
}

/// Pending outcome of one event submitted with [`Dispatcher::send`].
///
/// Dropping the receipt does not cancel the event.
#[must_use = "a receipt does nothing unless its outcome is awaited"]
pub struct Receipt<R> {
    state: ReceiptState<R>,
}

impl<R> Receipt<R> {
    /// Wait until the event has been processed.
    ///
    /// Resolves to the record published for this event, the error that
    /// aborted its transition, or [`DispatchError::Closed`] if the store
    /// shut down before reaching it.
    pub async fn outcome(self) -> Result<Arc<R>, DispatchError> {
        match self.state {
            ReceiptState::Rejected(error) => Err(error),
            ReceiptState::Pending(rx) => match rx.await {
                Ok(result) => result.map_err(DispatchError::from),
                Err(_) => Err(DispatchError::Closed),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Schema, SchemaError};

    #[derive(Debug)]
    struct Empty;

    impl Record for Empty {
        type Event = u32;

        fn schema() -> Result<Schema<Self>, SchemaError> {
            Schema::builder().build(|_| Ok(Empty))
        }
    }

    #[tokio::test]
    async fn events_arrive_in_dispatch_order() {
        let (dispatcher, mut inbox) = inbox::<Empty>(None);

        for event in 0..5 {
            dispatcher.dispatch(event);
        }

        for expected in 0..5 {
            let envelope = inbox.recv().await.unwrap();
            assert_eq!(envelope.event, expected);
            assert!(envelope.reply.is_none());
        }
    }

    #[test]
    fn bounded_inbox_rejects_overflow() {
        let (dispatcher, _inbox) = inbox::<Empty>(Some(1));

        assert_eq!(dispatcher.try_dispatch(1), Ok(()));
        assert_eq!(
            dispatcher.try_dispatch(2),
            Err(DispatchError::InboxFull { capacity: 1 })
        );
    }

    #[tokio::test]
    async fn closed_inbox_rejects_events() {
        let (dispatcher, inbox) = inbox::<Empty>(None);
        drop(inbox);

        assert!(dispatcher.is_closed());
        assert_eq!(dispatcher.try_dispatch(1), Err(DispatchError::Closed));
        assert!(matches!(
            dispatcher.send(2).outcome().await,
            Err(DispatchError::Closed)
        ));
    }

    #[tokio::test]
    async fn receipt_resolves_with_reply() {
        let (dispatcher, mut inbox) = inbox::<Empty>(None);
        let receipt = dispatcher.send(7);

        let envelope = inbox.recv().await.unwrap();
        let reply = envelope.reply.unwrap();
        let _ = reply.send(Err(TransitionError::CircularDependency {
            chain: vec!["a", "a"],
        }));

        assert_eq!(
            receipt.outcome().await.unwrap_err(),
            DispatchError::Transition(TransitionError::CircularDependency {
                chain: vec!["a", "a"]
            })
        );
    }

    #[tokio::test]
    async fn receipt_reports_closed_when_reply_dropped() {
        let (dispatcher, mut inbox) = inbox::<Empty>(None);
        let receipt = dispatcher.send(7);

        drop(inbox.recv().await);

        assert!(matches!(
            receipt.outcome().await,
            Err(DispatchError::Closed)
        ));
    }
}
