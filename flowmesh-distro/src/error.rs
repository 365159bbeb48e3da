//! Distro error taxonomy.

use flowmesh_grid::GridError;
use thiserror::Error;

/// Errors surfaced by the distribution protocol. All are fatal to the one
/// operation that raised them; none are retried automatically.
#[derive(Debug, Error)]
pub enum DistroError {
    /// No registered repository supports the requested entity kind and
    /// source. A configuration or capability mismatch, surfaced immediately
    /// to the caller and never silently degraded.
    #[error("no registered repository supports entity kind '{kind}' from source '{source}'")]
    UnsupportedEntity { kind: String, source: String },

    /// Raised eagerly on construction with a descriptive message rather
    /// than failing later with a generic fault.
    #[error("invalid distro configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration document is not parseable: {0}")]
    ConfigParse(String),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("routing registration failed: {0}")]
    Routing(String),

    #[error("dao failure: {0}")]
    Dao(String),
}
