//! The store: composition root and external contract.
//!
//! A [`Store`] owns the published record, the inbox, and the updater task.
//! Producers call [`dispatch`](Store::dispatch); readers call
//! [`subscribe`](Store::subscribe) or [`state`](Store::state).

use crate::broadcast::{StateCell, Subscription};
use crate::builder::{BuildError, StoreBuilder};
use crate::core::{Record, TransitionError};
use crate::effects::{DispatchError, Dispatcher, Receipt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Identifier of one store instance, attached to its log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(Uuid);

impl StoreId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Notification that one transition was aborted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFailure {
    /// Store the transition belonged to.
    pub store: StoreId,
    /// Position of the failed event among all processed events, from 1.
    pub sequence: u64,
    /// Why the transition was aborted.
    pub error: TransitionError,
    /// When the failure was detected.
    pub at: DateTime<Utc>,
}

/// Handle to a running update pipeline.
///
/// Dropping the store stops its updater without waiting for it; call
/// [`close`](Store::close) to stop it and wait for shutdown to finish.
pub struct Store<R: Record> {
    id: StoreId,
    cell: Arc<StateCell<R>>,
    dispatcher: Dispatcher<R>,
    failures: broadcast::Sender<TransitionFailure>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Record> Store<R> {
    /// Start configuring a store.
    pub fn builder() -> StoreBuilder<R> {
        StoreBuilder::new()
    }

    /// A store with default configuration and no reactions, starting from
    /// `initial`, running on the current tokio runtime.
    pub fn new(initial: R) -> Result<Self, BuildError> {
        Self::builder().initial(initial).build()
    }

    pub(crate) fn from_parts(
        id: StoreId,
        cell: Arc<StateCell<R>>,
        dispatcher: Dispatcher<R>,
        failures: broadcast::Sender<TransitionFailure>,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            cell,
            dispatcher,
            failures,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The most recently published record.
    pub fn state(&self) -> Arc<R> {
        self.cell.latest()
    }

    /// Number of records published since the store was built.
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// The current record followed by every record published afterwards.
    pub fn subscribe(&self) -> Subscription<R> {
        self.cell.subscribe()
    }

    /// Notifications for aborted transitions, from now on.
    pub fn failures(&self) -> broadcast::Receiver<TransitionFailure> {
        self.failures.subscribe()
    }

    /// A cloneable handle for producers that should not own the store.
    pub fn dispatcher(&self) -> Dispatcher<R> {
        self.dispatcher.clone()
    }

    /// Enqueue `event` without waiting. See [`Dispatcher::dispatch`].
    pub fn dispatch(&self, event: R::Event) {
        self.dispatcher.dispatch(event)
    }

    /// Enqueue `event`, reporting rejection. See [`Dispatcher::try_dispatch`].
    pub fn try_dispatch(&self, event: R::Event) -> Result<(), DispatchError> {
        self.dispatcher.try_dispatch(event)
    }

    /// Enqueue `event` and get a receipt for its outcome.
    pub fn send(&self, event: R::Event) -> Receipt<R> {
        self.dispatcher.send(event)
    }

    /// Whether the updater has stopped.
    pub fn is_closed(&self) -> bool {
        self.dispatcher.is_closed()
    }

    /// Stop processing and wait for the updater to shut down.
    ///
    /// Events still queued are dropped. In-flight reactions are handled per
    /// [`StoreConfig::on_close`](crate::StoreConfig::on_close). Calling
    /// `close` again is a no-op.
    pub async fn close(&self) {
        // The updater may already be gone (halted); nothing to signal then.
        let _ = self.shutdown.send(true);

        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                tracing::error!(store = %self.id, error = %err, "updater task failed");
            }
        }
    }
}

impl<R: Record> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("version", &self.version())
            .field("closed", &self.is_closed())
            .finish()
    }
}
