//! Observability model: canonical event names for distro components.

pub mod events;
