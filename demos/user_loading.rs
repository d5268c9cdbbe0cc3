//! User Loading
//!
//! This example models a loading screen whose data arrives asynchronously.
//!
//! Key concepts:
//! - An enum-valued property (loading, loaded, failed)
//! - An optional property holding the last error
//! - A reaction that performs the "fetch" and dispatches the result
//!
//! Run with: cargo run --example user_loading

use fieldflow::{
    field, Dispatcher, Field, Property, Reaction, Record, Schema, SchemaError, Store,
    TransitionContext, TransitionError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
enum UserEvent {
    LoadUser(u32),
    UserLoaded(String),
    UserLoadFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Loading<T> {
    Pending,
    Success(T),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
struct UserData(Loading<String>);

#[derive(Debug, Clone, PartialEq)]
struct LastError(Option<String>);

#[derive(Debug, Clone, PartialEq)]
struct UserState {
    user_data: UserData,
    last_error: LastError,
}

impl UserState {
    const USER_DATA: Field<Self, UserData> = field!(UserState, user_data);
    const LAST_ERROR: Field<Self, LastError> = field!(UserState, last_error);
}

impl Property<UserState> for UserData {
    type Value = Loading<String>;

    fn value(&self) -> &Loading<String> {
        &self.0
    }

    fn initial() -> Self {
        UserData(Loading::Pending)
    }

    fn spec(
        &self,
        _ctx: &mut TransitionContext<'_, UserState>,
        event: &UserEvent,
    ) -> Result<Self, TransitionError> {
        Ok(UserData(match event {
            UserEvent::LoadUser(_) => Loading::Pending,
            UserEvent::UserLoaded(name) => Loading::Success(name.clone()),
            UserEvent::UserLoadFailed(error) => Loading::Error(error.clone()),
        }))
    }
}

impl Property<UserState> for LastError {
    type Value = Option<String>;

    fn value(&self) -> &Option<String> {
        &self.0
    }

    fn initial() -> Self {
        LastError(None)
    }

    fn spec(
        &self,
        _ctx: &mut TransitionContext<'_, UserState>,
        event: &UserEvent,
    ) -> Result<Self, TransitionError> {
        Ok(LastError(match event {
            UserEvent::UserLoadFailed(error) => Some(error.clone()),
            UserEvent::LoadUser(_) | UserEvent::UserLoaded(_) => None,
        }))
    }
}

impl Record for UserState {
    type Event = UserEvent;

    fn schema() -> Result<Schema<Self>, SchemaError> {
        Schema::builder()
            .property(Self::USER_DATA)
            .property(Self::LAST_ERROR)
            .build(|values| {
                Ok(UserState {
                    user_data: values.take(Self::USER_DATA)?,
                    last_error: values.take(Self::LAST_ERROR)?,
                })
            })
    }
}

/// Pretends to call a user service.
struct FetchUser {
    latency: Duration,
}

#[fieldflow::async_trait]
impl Reaction<UserState> for FetchUser {
    async fn react(
        &self,
        _record: Arc<UserState>,
        event: Arc<UserEvent>,
        dispatch: Dispatcher<UserState>,
    ) {
        let UserEvent::LoadUser(id) = *event else {
            return;
        };

        tokio::time::sleep(self.latency).await;
        match id {
            0 => dispatch.dispatch(UserEvent::UserLoadFailed("user 0 does not exist".into())),
            id => dispatch.dispatch(UserEvent::UserLoaded(format!("User #{id}"))),
        }
    }
}

fn describe(record: &UserState) -> String {
    let status = match &record.user_data.0 {
        Loading::Pending => "Loading...".to_string(),
        Loading::Success(name) => format!("User: {name}"),
        Loading::Error(message) => format!("Error: {message}"),
    };
    let error = match &record.last_error.0 {
        Some(error) => format!("Last error: {error}"),
        None => "No errors".to_string(),
    };
    format!("{status} | {error}")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== User Loading ===\n");

    let store = Store::<UserState>::builder()
        .reaction(FetchUser {
            latency: Duration::from_millis(200),
        })
        .build()?;

    let mut subscription = store.subscribe();
    let observer = tokio::spawn(async move {
        while let Some(record) = subscription.next().await {
            println!("  {}", describe(&record));
        }
    });

    println!("--- Load user 42 ---");
    store.dispatch(UserEvent::LoadUser(42));
    tokio::time::sleep(Duration::from_millis(400)).await;

    println!("--- Load user 0 ---");
    store.dispatch(UserEvent::LoadUser(0));
    tokio::time::sleep(Duration::from_millis(400)).await;

    store.close().await;
    observer.await?;
    Ok(())
}
