//! The entity contract for distributable object pools.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;

/// An entity that can be pooled across the cluster.
///
/// Entities cross the grid as serialized values; the kind name is the stable
/// identifier every member derives grid resource names from, so it must be
/// identical across the whole cluster for one entity type.
pub trait Distributable:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    type Id: Eq + Hash + Clone + Display + Send + Sync;

    /// Short, stable entity kind name used in grid resource names.
    fn kind() -> &'static str;

    fn id(&self) -> Self::Id;
}
