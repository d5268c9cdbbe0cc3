//! Store configuration.
//!
//! [`StoreConfig`] is plain data with serde support so hosts can embed it in
//! their own configuration files. Every field has a default.

use serde::{Deserialize, Serialize};

/// What the updater does after a transition fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drop the failed event and keep processing the inbox.
    #[default]
    Skip,

    /// Stop the updater. The last published record stays visible and
    /// further dispatches are rejected as closed.
    Halt,
}

/// What happens to in-flight reactions when the store closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionShutdown {
    /// Cancel running reactions at their next suspension point.
    #[default]
    Abort,

    /// Wait for every running reaction to finish before `close` returns.
    Await,

    /// Leave running reactions alone; they finish on the runtime unobserved.
    Detach,
}

/// Tunables for a [`Store`](crate::Store).
///
/// # Example
///
/// ```
/// use fieldflow::{FailurePolicy, StoreConfig};
///
/// let config = StoreConfig {
///     on_failure: FailurePolicy::Halt,
///     ..StoreConfig::default()
/// };
/// assert_eq!(config.inbox_capacity, None);
/// assert_eq!(config.failure_buffer, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bound on queued events. `None` means unbounded, so dispatch never
    /// fails for backpressure; with a bound, overflow is rejected.
    ///
    /// Default: `None`.
    pub inbox_capacity: Option<usize>,

    /// Policy for failed transitions.
    ///
    /// Default: [`FailurePolicy::Skip`].
    pub on_failure: FailurePolicy,

    /// Policy for in-flight reactions on close.
    ///
    /// Default: [`ReactionShutdown::Abort`].
    pub on_close: ReactionShutdown,

    /// How many failure notifications a slow failure subscriber may lag
    /// behind before it starts missing them.
    ///
    /// Default: 64.
    pub failure_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: None,
            on_failure: FailurePolicy::Skip,
            on_close: ReactionShutdown::Abort,
            failure_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.inbox_capacity, None);
        assert_eq!(config.on_failure, FailurePolicy::Skip);
        assert_eq!(config.on_close, ReactionShutdown::Abort);
        assert_eq!(config.failure_buffer, 64);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "inbox_capacity": 8, "on_failure": "halt" }"#).unwrap();

        assert_eq!(config.inbox_capacity, Some(8));
        assert_eq!(config.on_failure, FailurePolicy::Halt);
        assert_eq!(config.on_close, ReactionShutdown::Abort);
        assert_eq!(config.failure_buffer, 64);
    }

    #[test]
    fn policies_serialize_in_snake_case() {
        let config = StoreConfig {
            on_close: ReactionShutdown::Await,
            ..StoreConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["on_close"], "await");
        assert_eq!(json["on_failure"], "skip");
        assert_eq!(json["inbox_capacity"], serde_json::Value::Null);
    }
}
