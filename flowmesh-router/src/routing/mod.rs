//! Message-distribution layer.
//!
//! Owns the subscription registry, the publication/subscription match
//! policy, and the per-subscriber dispatch workers that isolate recipients
//! from each other.

mod dispatch_worker;
mod distributor;

pub use distributor::MessageDistributor;
pub(crate) use dispatch_worker::DispatchWorker;
