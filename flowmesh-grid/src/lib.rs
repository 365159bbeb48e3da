/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # flowmesh-grid
//!
//! Named distributed-resource primitives shared by every flowmesh component:
//! maps, bounded queues, lists, and mutual-exclusion locks, addressable only
//! by string name. Two implementations satisfy the same [`Grid`] contract:
//!
//! - [`LocalGrid`] keeps every resource in process memory and is the backing
//!   for single-node deployments and tests.
//! - [`RedisGrid`] maps each resource onto a Redis structure visible to every
//!   cluster member.
//!
//! Resource identity is purely nominal: two callers asking the same grid for
//! the same name (and kind) observe the same data.
//!
//! ```
//! use flowmesh_grid::{Grid, GridMap, GridQueue, LocalGrid};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let grid = LocalGrid::new();
//!
//! let registry = grid.map("distroRegistry").await.unwrap();
//! registry.put("manager-1", b"0".to_vec()).await.unwrap();
//!
//! let same_registry = grid.map("distroRegistry").await.unwrap();
//! assert_eq!(
//!     same_registry.get("manager-1").await.unwrap(),
//!     Some(b"0".to_vec()),
//! );
//!
//! let queue = grid.queue("work", 16).await.unwrap();
//! queue.put(b"item".to_vec()).await.unwrap();
//! assert_eq!(queue.take().await.unwrap(), b"item".to_vec());
//! # });
//! ```
//!
//! Queues block the producer when full and the consumer when empty; this is
//! the system's backpressure mechanism. A closed queue surfaces
//! [`GridError::Interrupted`] from the blocked side, which consume loops
//! treat as their terminal signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

mod local;
pub use local::LocalGrid;

mod distributed;
pub use distributed::{RedisGrid, RedisGridConfig};

mod typed;
pub use typed::{TypedMap, TypedQueue};

/// Buffered map-change events per watcher before events are dropped.
pub const WATCH_BUFFER: usize = 64;

/// Errors produced by grid resources.
#[derive(Debug, Error)]
pub enum GridError {
    /// The grid could not produce a usable lock handle for the name.
    #[error("lock '{name}' is unavailable: {reason}")]
    LockUnavailable { name: String, reason: String },

    /// A blocking wait ended because the resource was closed or the grid is
    /// shutting down. Terminal for the enclosing consume loop, never a fault.
    #[error("wait on '{name}' was interrupted")]
    Interrupted { name: String },

    /// The distributed backend rejected or failed an operation.
    #[error("grid backend failure: {0}")]
    Backend(String),

    /// A grid value could not be encoded or decoded.
    #[error("grid value codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Change kind for one map entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MapEventKind {
    Added,
    Updated,
    Removed,
}

/// A single entry-change notification from a watched map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapEvent {
    pub kind: MapEventKind,
    pub key: String,
    pub value: Option<Vec<u8>>,
}

/// Named key/value map resource.
#[async_trait]
pub trait GridMap: Send + Sync {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), GridError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GridError>;
    /// Removes an entry, returning the previous value when one existed.
    async fn remove(&self, key: &str) -> Result<Option<Vec<u8>>, GridError>;
    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, GridError>;
    /// Registers an entry-change watcher. Events arrive in mutation order;
    /// a watcher that falls more than [`WATCH_BUFFER`] events behind loses
    /// the overflow.
    async fn watch(&self) -> Result<mpsc::Receiver<MapEvent>, GridError>;
}

/// Named bounded blocking queue with competing-consumer semantics: each item
/// is delivered to exactly one taker.
#[async_trait]
pub trait GridQueue: Send + Sync {
    /// Enqueues one item, blocking while the queue is at capacity.
    async fn put(&self, item: Vec<u8>) -> Result<(), GridError>;
    /// Enqueues one item only if capacity is immediately available.
    /// Returns `false` when the queue is full.
    async fn try_put(&self, item: Vec<u8>) -> Result<bool, GridError>;
    /// Dequeues one item, blocking while the queue is empty.
    async fn take(&self) -> Result<Vec<u8>, GridError>;
    /// Closes the queue. Blocked and future takes observe
    /// [`GridError::Interrupted`] once drained.
    fn close(&self);
}

/// Named append-only list resource.
#[async_trait]
pub trait GridList: Send + Sync {
    async fn push(&self, item: Vec<u8>) -> Result<(), GridError>;
    async fn items(&self) -> Result<Vec<Vec<u8>>, GridError>;
    async fn clear(&self) -> Result<(), GridError>;
}

/// Named mutual-exclusion lock resource.
///
/// `acquire` either returns a usable [`LockLease`] or fails with
/// [`GridError::LockUnavailable`]; it never yields an absent handle.
#[async_trait]
pub trait GridLock: Send + Sync {
    async fn acquire(&self) -> Result<LockLease, GridError>;
}

/// Backing state for one granted lock lease.
#[async_trait]
pub trait Lease: Send {
    async fn release(self: Box<Self>);
    fn lock_name(&self) -> &str;
}

/// A granted exclusive lease on a named lock.
///
/// Call [`LockLease::release`] when done. Dropping an unreleased lease is
/// logged; a distributed lease left to drop stays held until its TTL lapses.
pub struct LockLease {
    inner: Option<Box<dyn Lease>>,
}

impl LockLease {
    pub fn new(inner: Box<dyn Lease>) -> Self {
        Self { inner: Some(inner) }
    }

    pub async fn release(mut self) {
        if let Some(lease) = self.inner.take() {
            lease.release().await;
        }
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if let Some(lease) = self.inner.take() {
            warn!(
                lock = lease.lock_name(),
                "lock lease dropped without release"
            );
        }
    }
}

/// The grid contract: named resources, lazily created on first access,
/// shared by every later fetch of the same name.
#[async_trait]
pub trait Grid: Send + Sync {
    async fn map(&self, name: &str) -> Result<Arc<dyn GridMap>, GridError>;
    /// Fetches or creates a bounded queue. The capacity of the first
    /// creation wins; later fetches of the same name ignore their argument.
    async fn queue(&self, name: &str, capacity: usize) -> Result<Arc<dyn GridQueue>, GridError>;
    async fn list(&self, name: &str) -> Result<Arc<dyn GridList>, GridError>;
    async fn lock(&self, name: &str) -> Result<Arc<dyn GridLock>, GridError>;
}
