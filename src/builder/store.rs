//! Builder for constructing stores.

use crate::broadcast::StateCell;
use crate::builder::error::BuildError;
use crate::config::{FailurePolicy, ReactionShutdown, StoreConfig};
use crate::core::Record;
use crate::effects::updater::Updater;
use crate::effects::{inbox, reaction_fn, Dispatcher, Reaction};
use crate::store::{Store, StoreId};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tracing::Instrument;

/// Builder for a [`Store`] with a fluent API.
pub struct StoreBuilder<R: Record> {
    initial: Option<R>,
    reactions: Vec<Arc<dyn Reaction<R>>>,
    config: StoreConfig,
    runtime: Option<Handle>,
}

impl<R: Record> StoreBuilder<R> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            reactions: Vec::new(),
            config: StoreConfig::default(),
            runtime: None,
        }
    }

    /// Set the starting record. Defaults to [`Record::initial`].
    pub fn initial(mut self, record: R) -> Self {
        self.initial = Some(record);
        self
    }

    /// Register a reaction.
    pub fn reaction(mut self, reaction: impl Reaction<R>) -> Self {
        self.reactions.push(Arc::new(reaction));
        self
    }

    /// Register an async closure as a reaction.
    pub fn reaction_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<R>, Arc<R::Event>, Dispatcher<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.reaction(reaction_fn(f))
    }

    /// Register several shared reactions at once.
    pub fn reactions(mut self, reactions: impl IntoIterator<Item = Arc<dyn Reaction<R>>>) -> Self {
        self.reactions.extend(reactions);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound the inbox. Without this the inbox is unbounded.
    pub fn inbox_capacity(mut self, capacity: usize) -> Self {
        self.config.inbox_capacity = Some(capacity);
        self
    }

    /// What to do after a failed transition. See [`FailurePolicy`].
    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.config.on_failure = policy;
        self
    }

    /// What happens to in-flight reactions on close. See [`ReactionShutdown`].
    pub fn on_close(mut self, policy: ReactionShutdown) -> Self {
        self.config.on_close = policy;
        self
    }

    /// Run the updater and reactions on `handle` instead of the current
    /// runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Register the record schema and start the updater.
    ///
    /// Fails if the configuration has a zero capacity, the schema is
    /// invalid, no runtime is available, or no initial record was given and
    /// the default one cannot be built.
    pub fn build(self) -> Result<Store<R>, BuildError> {
        if self.config.inbox_capacity == Some(0) {
            return Err(BuildError::InvalidCapacity {
                setting: "inbox_capacity",
            });
        }
        if self.config.failure_buffer == 0 {
            return Err(BuildError::InvalidCapacity {
                setting: "failure_buffer",
            });
        }

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };

        let schema = Arc::new(R::schema()?);
        let initial = match self.initial {
            Some(record) => record,
            None => schema.initial()?,
        };

        let id = StoreId::new();
        let cell = Arc::new(StateCell::new(Arc::new(initial)));
        let (dispatcher, inbox) = inbox(self.config.inbox_capacity);
        let (failures, _) = broadcast::channel(self.config.failure_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let updater = Updater::new(
            id,
            schema,
            Arc::clone(&cell),
            self.reactions,
            dispatcher.clone(),
            failures.clone(),
            &self.config,
        );
        let span = tracing::info_span!("store", id = %id);
        let task = runtime.spawn(updater.run(inbox, shutdown_rx).instrument(span));

        Ok(Store::from_parts(
            id,
            cell,
            dispatcher,
            failures,
            shutdown_tx,
            task,
        ))
    }
}

impl<R: Record> Default for StoreBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Schema, SchemaError};

    #[derive(Debug)]
    struct Blank;

    impl Record for Blank {
        type Event = ();

        fn schema() -> Result<Schema<Self>, SchemaError> {
            Schema::builder().build(|_| Ok(Blank))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Record for Broken {
        type Event = ();

        fn schema() -> Result<Schema<Self>, SchemaError> {
            Schema::builder().build(|_| {
                Err(SchemaError::Construction {
                    record: "Broken",
                    reason: "no defaults".to_string(),
                })
            })
        }
    }

    #[test]
    fn builder_requires_runtime() {
        let result = StoreBuilder::<Blank>::new().build();

        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[tokio::test]
    async fn builder_rejects_zero_capacity() {
        let result = StoreBuilder::<Blank>::new().inbox_capacity(0).build();
        assert!(matches!(
            result,
            Err(BuildError::InvalidCapacity {
                setting: "inbox_capacity"
            })
        ));

        let result = StoreBuilder::<Blank>::new()
            .config(StoreConfig {
                failure_buffer: 0,
                ..StoreConfig::default()
            })
            .build();
        assert!(matches!(
            result,
            Err(BuildError::InvalidCapacity {
                setting: "failure_buffer"
            })
        ));
    }

    #[tokio::test]
    async fn builder_reports_unbuildable_initial_record() {
        let result = StoreBuilder::<Broken>::new().build();

        assert!(matches!(
            result,
            Err(BuildError::Schema(SchemaError::Construction { .. }))
        ));
    }

    #[tokio::test]
    async fn explicit_initial_skips_default_record() {
        let store = StoreBuilder::new().initial(Broken).build().unwrap();

        assert_eq!(store.version(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn fluent_api_applies_config() {
        let store = StoreBuilder::<Blank>::new()
            .inbox_capacity(4)
            .on_failure(FailurePolicy::Halt)
            .on_close(ReactionShutdown::Await)
            .runtime(Handle::current())
            .reaction_fn(|_record, _event, _dispatch| async {})
            .build()
            .unwrap();

        assert!(!store.is_closed());
        store.close().await;
    }
}
