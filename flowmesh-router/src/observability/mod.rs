//! Observability model: canonical event names and field helpers.
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber;
//! binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

pub mod events;
pub mod fields;
