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

//! In-process [`Grid`] implementation for single-node deployments and tests.

use crate::{
    Grid, GridError, GridList, GridLock, GridMap, GridQueue, Lease, LockLease, MapEvent,
    MapEventKind, WATCH_BUFFER,
};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tracing::warn;

/// Size of the coarse local lock pool. Lock names hash onto one of these
/// mutexes; distinct names may share a mutex. Acceptable only for
/// non-distributed deployments.
const LOCK_POOL_SIZE: usize = 8;

/// Single-process grid: every resource lives in this struct, created lazily
/// on first access and shared with every later fetch of the same name.
pub struct LocalGrid {
    maps: Mutex<HashMap<String, Arc<LocalMap>>>,
    queues: Mutex<HashMap<String, Arc<LocalQueue>>>,
    lists: Mutex<HashMap<String, Arc<LocalList>>>,
    lock_pool: Vec<Arc<Mutex<()>>>,
}

impl LocalGrid {
    pub fn new() -> Self {
        Self {
            maps: Mutex::new(HashMap::new()),
            queues: Mutex::new(HashMap::new()),
            lists: Mutex::new(HashMap::new()),
            lock_pool: (0..LOCK_POOL_SIZE)
                .map(|_| Arc::new(Mutex::new(())))
                .collect(),
        }
    }
}

impl Default for LocalGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Grid for LocalGrid {
    async fn map(&self, name: &str) -> Result<Arc<dyn GridMap>, GridError> {
        let mut maps = self.maps.lock().await;
        let map = maps
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LocalMap::new(name)))
            .clone();
        Ok(map)
    }

    async fn queue(&self, name: &str, capacity: usize) -> Result<Arc<dyn GridQueue>, GridError> {
        let mut queues = self.queues.lock().await;
        let queue = queues
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LocalQueue::new(name, capacity)))
            .clone();
        Ok(queue)
    }

    async fn list(&self, name: &str) -> Result<Arc<dyn GridList>, GridError> {
        let mut lists = self.lists.lock().await;
        let list = lists
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LocalList::default()))
            .clone();
        Ok(list)
    }

    async fn lock(&self, name: &str) -> Result<Arc<dyn GridLock>, GridError> {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let slot = (hasher.finish() as usize) % self.lock_pool.len();
        Ok(Arc::new(LocalLock {
            name: name.to_string(),
            mutex: self.lock_pool[slot].clone(),
        }))
    }
}

struct LocalMap {
    name: String,
    entries: Mutex<HashMap<String, Vec<u8>>>,
    watchers: Mutex<Vec<mpsc::Sender<MapEvent>>>,
}

impl LocalMap {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(HashMap::new()),
            watchers: Mutex::new(Vec::new()),
        }
    }

    async fn notify(&self, event: MapEvent) {
        let mut watchers = self.watchers.lock().await;
        watchers.retain(|watcher| match watcher.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    map = self.name.as_str(),
                    key = event.key.as_str(),
                    "map watcher fell behind; dropping event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }
}

#[async_trait]
impl GridMap for LocalMap {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), GridError> {
        let previous = {
            let mut entries = self.entries.lock().await;
            entries.insert(key.to_string(), value.clone())
        };
        let kind = if previous.is_some() {
            MapEventKind::Updated
        } else {
            MapEventKind::Added
        };
        self.notify(MapEvent {
            kind,
            key: key.to_string(),
            value: Some(value),
        })
        .await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GridError> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<Option<Vec<u8>>, GridError> {
        let previous = {
            let mut entries = self.entries.lock().await;
            entries.remove(key)
        };
        if previous.is_some() {
            self.notify(MapEvent {
                kind: MapEventKind::Removed,
                key: key.to_string(),
                value: None,
            })
            .await;
        }
        Ok(previous)
    }

    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, GridError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<MapEvent>, GridError> {
        let (sender, receiver) = mpsc::channel(WATCH_BUFFER);
        self.watchers.lock().await.push(sender);
        Ok(receiver)
    }
}

struct LocalQueue {
    name: String,
    sender: async_channel::Sender<Vec<u8>>,
    receiver: async_channel::Receiver<Vec<u8>>,
}

impl LocalQueue {
    fn new(name: &str, capacity: usize) -> Self {
        let (sender, receiver) = async_channel::bounded(capacity.max(1));
        Self {
            name: name.to_string(),
            sender,
            receiver,
        }
    }

    fn interrupted(&self) -> GridError {
        GridError::Interrupted {
            name: self.name.clone(),
        }
    }
}

#[async_trait]
impl GridQueue for LocalQueue {
    async fn put(&self, item: Vec<u8>) -> Result<(), GridError> {
        self.sender
            .send(item)
            .await
            .map_err(|_| self.interrupted())
    }

    async fn try_put(&self, item: Vec<u8>) -> Result<bool, GridError> {
        match self.sender.try_send(item) {
            Ok(()) => Ok(true),
            Err(async_channel::TrySendError::Full(_)) => Ok(false),
            Err(async_channel::TrySendError::Closed(_)) => Err(self.interrupted()),
        }
    }

    async fn take(&self) -> Result<Vec<u8>, GridError> {
        self.receiver.recv().await.map_err(|_| self.interrupted())
    }

    fn close(&self) {
        self.sender.close();
    }
}

#[derive(Default)]
struct LocalList {
    items: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl GridList for LocalList {
    async fn push(&self, item: Vec<u8>) -> Result<(), GridError> {
        self.items.lock().await.push(item);
        Ok(())
    }

    async fn items(&self) -> Result<Vec<Vec<u8>>, GridError> {
        Ok(self.items.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), GridError> {
        self.items.lock().await.clear();
        Ok(())
    }
}

struct LocalLock {
    name: String,
    mutex: Arc<Mutex<()>>,
}

#[async_trait]
impl GridLock for LocalLock {
    async fn acquire(&self) -> Result<LockLease, GridError> {
        let guard = self.mutex.clone().lock_owned().await;
        Ok(LockLease::new(Box::new(LocalLease {
            name: self.name.clone(),
            _guard: guard,
        })))
    }
}

struct LocalLease {
    name: String,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl Lease for LocalLease {
    async fn release(self: Box<Self>) {}

    fn lock_name(&self) -> &str {
        &self.name
    }
}
