//! Router error taxonomy.

use thiserror::Error;

/// Errors surfaced by the routing core. All are fatal to the one operation
/// that raised them; none are retried automatically.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("subscription '{owner}/{name}' is already registered")]
    AlreadyRegistered { owner: String, name: String },

    #[error("subscription '{owner}/{name}' is not registered")]
    NotRegistered { owner: String, name: String },

    /// A listener reported a failure while handling one delivery. Logged by
    /// the dispatch loop; never propagated to other recipients.
    #[error("listener failure: {0}")]
    Listener(String),
}
