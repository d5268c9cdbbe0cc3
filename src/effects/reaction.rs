//! Reactions: asynchronous work launched after a transition is published.
//!
//! Transitions themselves are pure. Anything impure (I/O, timers, calls to
//! other services) lives in a [`Reaction`], which sees the freshly published
//! record and the event that produced it and may dispatch further events.

use super::dispatch::Dispatcher;
use crate::core::Record;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Asynchronous response to a completed transition.
///
/// Each registered reaction runs as its own task after every publish,
/// concurrently with other reactions and with later transitions. Events it
/// dispatches join the back of the same inbox as external events.
#[async_trait]
pub trait Reaction<R: Record>: Send + Sync + 'static {
    async fn react(&self, record: Arc<R>, event: Arc<R::Event>, dispatch: Dispatcher<R>);
}

/// Adapter turning an async closure into a [`Reaction`].
///
/// # Example
///
/// ```rust
/// use fieldflow::effects::{reaction_fn, Dispatcher, Reaction};
/// # use fieldflow::core::{Record, Schema, SchemaError};
/// # struct Ping;
/// # impl Record for Ping {
/// #     type Event = u8;
/// #     fn schema() -> Result<Schema<Self>, SchemaError> {
/// #         Schema::builder().build(|_| Ok(Ping))
/// #     }
/// # }
/// use std::sync::Arc;
///
/// let echo = reaction_fn(|_record: Arc<Ping>, event: Arc<u8>, dispatch: Dispatcher<Ping>| async move {
///     if *event < 3 {
///         dispatch.dispatch(*event + 1);
///     }
/// });
/// # fn assert_reaction<T: Reaction<Ping>>(_: &T) {}
/// # assert_reaction(&echo);
/// ```
pub fn reaction_fn<F>(f: F) -> FnReaction<F> {
    FnReaction(f)
}

/// A [`Reaction`] backed by a closure. Built with [`reaction_fn`].
pub struct FnReaction<F>(F);

#[async_trait]
impl<R, F, Fut> Reaction<R> for FnReaction<F>
where
    R: Record,
    F: Fn(Arc<R>, Arc<R::Event>, Dispatcher<R>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn react(&self, record: Arc<R>, event: Arc<R::Event>, dispatch: Dispatcher<R>) {
        (self.0)(record, event, dispatch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Schema, SchemaError};
    use crate::effects::dispatch::inbox;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Beacon;

    impl Record for Beacon {
        type Event = u32;

        fn schema() -> Result<Schema<Self>, SchemaError> {
            Schema::builder().build(|_| Ok(Beacon))
        }
    }

    struct Forward;

    #[async_trait]
    impl Reaction<Beacon> for Forward {
        async fn react(&self, _record: Arc<Beacon>, event: Arc<u32>, dispatch: Dispatcher<Beacon>) {
            dispatch.dispatch(*event * 10);
        }
    }

    #[tokio::test]
    async fn trait_reaction_can_dispatch() {
        let (dispatcher, mut rx) = inbox::<Beacon>(None);

        Forward
            .react(Arc::new(Beacon), Arc::new(4), dispatcher.clone())
            .await;

        assert_eq!(rx.recv().await.unwrap().event, 40);
    }

    #[tokio::test]
    async fn closure_reaction_runs() {
        let (dispatcher, _rx) = inbox::<Beacon>(None);
        let seen = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&seen);

        let reaction = reaction_fn(
            move |_record: Arc<Beacon>, event: Arc<u32>, _dispatch: Dispatcher<Beacon>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.store(*event, Ordering::SeqCst);
                }
            },
        );

        let boxed: Arc<dyn Reaction<Beacon>> = Arc::new(reaction);
        boxed.react(Arc::new(Beacon), Arc::new(9), dispatcher).await;

        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }
}
