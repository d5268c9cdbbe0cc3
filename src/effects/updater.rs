//! Serialized transition loop.
//!
//! The updater is the only writer of a store's record. It takes one event
//! at a time from the inbox, runs a rebuild pass against the latest
//! published record, publishes the result, and only then launches
//! reactions. Transition `n + 1` never starts before transition `n` is
//! published or rejected.

use super::dispatch::{Dispatcher, Envelope, InboxReceiver};
use super::reaction::Reaction;
use crate::broadcast::StateCell;
use crate::config::{FailurePolicy, ReactionShutdown, StoreConfig};
use crate::core::{rebuild, Record, Schema};
use crate::store::{StoreId, TransitionFailure};
use chrono::Utc;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

pub(crate) struct Updater<R: Record> {
    id: StoreId,
    schema: Arc<Schema<R>>,
    cell: Arc<StateCell<R>>,
    reactions: Vec<Arc<dyn Reaction<R>>>,
    dispatcher: Dispatcher<R>,
    failures: broadcast::Sender<TransitionFailure>,
    on_failure: FailurePolicy,
    on_close: ReactionShutdown,
    in_flight: JoinSet<()>,
    sequence: u64,
}

impl<R: Record> Updater<R> {
    pub(crate) fn new(
        id: StoreId,
        schema: Arc<Schema<R>>,
        cell: Arc<StateCell<R>>,
        reactions: Vec<Arc<dyn Reaction<R>>>,
        dispatcher: Dispatcher<R>,
        failures: broadcast::Sender<TransitionFailure>,
        config: &StoreConfig,
    ) -> Self {
        Self {
            id,
            schema,
            cell,
            reactions,
            dispatcher,
            failures,
            on_failure: config.on_failure,
            on_close: config.on_close,
            in_flight: JoinSet::new(),
            sequence: 0,
        }
    }

    /// Process the inbox until shutdown is signalled, the shutdown sender
    /// is dropped, or a failure halts the loop.
    pub(crate) async fn run(
        mut self,
        mut inbox: InboxReceiver<R>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(
            record = self.schema.record_name(),
            reactions = self.reactions.len(),
            "updater started"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    tracing::debug!("shutdown requested");
                    break;
                }

                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    reap(joined);
                }

                envelope = inbox.recv() => {
                    let Some(envelope) = envelope else {
                        break;
                    };
                    if self.process(envelope).is_break() {
                        break;
                    }
                }
            }
        }

        // Queued events are dropped with the inbox; their receipts resolve
        // as closed.
        drop(inbox);
        self.cell.close();
        self.drain_reactions().await;

        tracing::info!(transitions = self.sequence, "updater stopped");
    }

    /// Apply one event. Breaks when the failure policy says to halt.
    fn process(&mut self, envelope: Envelope<R>) -> ControlFlow<()> {
        self.sequence += 1;
        let span = tracing::debug_span!("transition", sequence = self.sequence);
        let _entered = span.enter();

        let Envelope { event, reply } = envelope;
        let current = self.cell.latest();

        match rebuild(&self.schema, &current, &event) {
            Ok(next) => {
                let next = Arc::new(next);
                let version = self.cell.publish(Arc::clone(&next));
                tracing::debug!(?version, "transition published");

                if let Some(reply) = reply {
                    let _ = reply.send(Ok(Arc::clone(&next)));
                }
                self.launch_reactions(next, Arc::new(event));
                ControlFlow::Continue(())
            }
            Err(error) => {
                tracing::warn!(%error, "transition aborted, previous record kept");

                // No failure subscribers is fine.
                let _ = self.failures.send(TransitionFailure {
                    store: self.id,
                    sequence: self.sequence,
                    error: error.clone(),
                    at: Utc::now(),
                });
                if let Some(reply) = reply {
                    let _ = reply.send(Err(error));
                }

                match self.on_failure {
                    FailurePolicy::Skip => ControlFlow::Continue(()),
                    FailurePolicy::Halt => {
                        tracing::error!("failure policy is halt, stopping updater");
                        ControlFlow::Break(())
                    }
                }
            }
        }
    }

    fn launch_reactions(&mut self, record: Arc<R>, event: Arc<R::Event>) {
        for reaction in &self.reactions {
            let reaction = Arc::clone(reaction);
            let record = Arc::clone(&record);
            let event = Arc::clone(&event);
            let dispatch = self.dispatcher.clone();
            let span = tracing::debug_span!("reaction", sequence = self.sequence);

            self.in_flight.spawn(
                async move { reaction.react(record, event, dispatch).await }.instrument(span),
            );
        }
    }

    async fn drain_reactions(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }

        match self.on_close {
            ReactionShutdown::Await => {
                tracing::debug!(in_flight = self.in_flight.len(), "awaiting reactions");
                while let Some(joined) = self.in_flight.join_next().await {
                    reap(joined);
                }
            }
            ReactionShutdown::Abort => {
                tracing::debug!(in_flight = self.in_flight.len(), "aborting reactions");
                self.in_flight.shutdown().await;
            }
            ReactionShutdown::Detach => {
                tracing::debug!(in_flight = self.in_flight.len(), "detaching reactions");
                self.in_flight.detach_all();
            }
        }
    }
}

fn reap(joined: Result<(), JoinError>) {
    match joined {
        Ok(()) => {}
        Err(err) if err.is_panic() => tracing::error!(error = %err, "reaction panicked"),
        Err(_) => {}
    }
}
