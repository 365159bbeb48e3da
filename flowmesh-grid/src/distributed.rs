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

//! Redis-backed [`Grid`] implementation for cluster-distributed deployments.
//!
//! Resource mapping: maps are Redis hashes with entry-change events published
//! on a per-map pub/sub channel; queues are Redis lists with a capacity guard
//! on the producer side and a blocking pop loop on the consumer side; locks
//! are `SET NX PX` token leases with a checked release.

use crate::{
    Grid, GridError, GridList, GridLock, GridMap, GridQueue, Lease, LockLease, MapEvent,
    MapEventKind, WATCH_BUFFER,
};
use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Connection settings for a [`RedisGrid`].
#[derive(Clone, Debug)]
pub struct RedisGridConfig {
    pub url: String,
    /// Prefix applied to every key and channel, isolating one cluster's
    /// resources from others sharing the Redis instance.
    pub namespace: String,
    /// TTL applied to lock keys; a lease lost to a crashed holder frees
    /// itself after this long.
    pub lock_ttl_ms: u64,
    /// Delay between contention retries on locks and full-queue puts.
    pub retry_delay_ms: u64,
}

impl Default for RedisGridConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            namespace: "flowmesh".to_string(),
            lock_ttl_ms: 30_000,
            retry_delay_ms: 50,
        }
    }
}

fn backend(err: impl Display) -> GridError {
    GridError::Backend(err.to_string())
}

/// Cluster-distributed grid over a shared Redis instance.
pub struct RedisGrid {
    pool: deadpool_redis::Pool,
    client: redis::Client,
    config: RedisGridConfig,
}

impl RedisGrid {
    /// Builds the connection pool and the pub/sub client. Fails eagerly when
    /// the URL cannot be parsed; actual connectivity faults surface from the
    /// first resource operation.
    pub fn connect(config: RedisGridConfig) -> Result<Self, GridError> {
        let pool = deadpool_redis::Config::from_url(&config.url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(backend)?;
        let client = redis::Client::open(config.url.as_str()).map_err(backend)?;
        Ok(Self {
            pool,
            client,
            config,
        })
    }

    fn key(&self, kind: &str, name: &str) -> String {
        format!("{}:{kind}:{name}", self.config.namespace)
    }
}

#[async_trait]
impl Grid for RedisGrid {
    async fn map(&self, name: &str) -> Result<Arc<dyn GridMap>, GridError> {
        Ok(Arc::new(RedisMap {
            pool: self.pool.clone(),
            client: self.client.clone(),
            key: self.key("map", name),
            events_channel: self.key("map-events", name),
        }))
    }

    async fn queue(&self, name: &str, capacity: usize) -> Result<Arc<dyn GridQueue>, GridError> {
        Ok(Arc::new(RedisQueue {
            pool: self.pool.clone(),
            name: name.to_string(),
            key: self.key("queue", name),
            capacity: capacity.max(1),
            retry_delay: Duration::from_millis(self.config.retry_delay_ms),
            closed: AtomicBool::new(false),
        }))
    }

    async fn list(&self, name: &str) -> Result<Arc<dyn GridList>, GridError> {
        Ok(Arc::new(RedisList {
            pool: self.pool.clone(),
            key: self.key("list", name),
        }))
    }

    async fn lock(&self, name: &str) -> Result<Arc<dyn GridLock>, GridError> {
        Ok(Arc::new(RedisLock {
            pool: self.pool.clone(),
            name: name.to_string(),
            key: self.key("lock", name),
            ttl_ms: self.config.lock_ttl_ms,
            retry_delay: Duration::from_millis(self.config.retry_delay_ms),
        }))
    }
}

struct RedisMap {
    pool: deadpool_redis::Pool,
    client: redis::Client,
    key: String,
    events_channel: String,
}

impl RedisMap {
    async fn publish_event(&self, event: &MapEvent) {
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(map = self.key.as_str(), err = %err, "unable to encode map event");
                return;
            }
        };
        match self.pool.get().await {
            Ok(mut conn) => {
                let published: Result<i64, _> = conn.publish(&self.events_channel, payload).await;
                if let Err(err) = published {
                    warn!(map = self.key.as_str(), err = %err, "unable to publish map event");
                }
            }
            Err(err) => {
                warn!(map = self.key.as_str(), err = %err, "no connection for map event");
            }
        }
    }
}

#[async_trait]
impl GridMap for RedisMap {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        let added: i64 = conn
            .hset(&self.key, key, value.clone())
            .await
            .map_err(backend)?;
        let kind = if added == 1 {
            MapEventKind::Added
        } else {
            MapEventKind::Updated
        };
        self.publish_event(&MapEvent {
            kind,
            key: key.to_string(),
            value: Some(value),
        })
        .await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        conn.hget(&self.key, key).await.map_err(backend)
    }

    async fn remove(&self, key: &str) -> Result<Option<Vec<u8>>, GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        let previous: Option<Vec<u8>> = conn.hget(&self.key, key).await.map_err(backend)?;
        if previous.is_some() {
            let _: i64 = conn.hdel(&self.key, key).await.map_err(backend)?;
            self.publish_event(&MapEvent {
                kind: MapEventKind::Removed,
                key: key.to_string(),
                value: None,
            })
            .await;
        }
        Ok(previous)
    }

    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>, GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        let entries: std::collections::HashMap<String, Vec<u8>> =
            conn.hgetall(&self.key).await.map_err(backend)?;
        Ok(entries.into_iter().collect())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<MapEvent>, GridError> {
        let (sender, receiver) = mpsc::channel(WATCH_BUFFER);
        let client = self.client.clone();
        let channel = self.events_channel.clone();

        tokio::spawn(async move {
            let mut pubsub = match client.get_async_pubsub().await {
                Ok(pubsub) => pubsub,
                Err(err) => {
                    warn!(channel = channel.as_str(), err = %err, "map watch connect failed");
                    return;
                }
            };
            if let Err(err) = pubsub.subscribe(&channel).await {
                warn!(channel = channel.as_str(), err = %err, "map watch subscribe failed");
                return;
            }
            let mut messages = pubsub.on_message();
            while let Some(message) = messages.next().await {
                let payload: Vec<u8> = match message.get_payload() {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(channel = channel.as_str(), err = %err, "bad map event payload");
                        continue;
                    }
                };
                match serde_json::from_slice::<MapEvent>(&payload) {
                    Ok(event) => {
                        if sender.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(channel = channel.as_str(), err = %err, "undecodable map event");
                    }
                }
            }
            debug!(channel = channel.as_str(), "map watch loop ended");
        });

        Ok(receiver)
    }
}

struct RedisQueue {
    pool: deadpool_redis::Pool,
    name: String,
    key: String,
    capacity: usize,
    retry_delay: Duration,
    /// Close is a per-process signal: it releases this process's blocked
    /// takers. Other cluster members keep their own handles.
    closed: AtomicBool,
}

impl RedisQueue {
    fn interrupted(&self) -> GridError {
        GridError::Interrupted {
            name: self.name.clone(),
        }
    }

    async fn offer(&self, item: &[u8]) -> Result<bool, GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        let depth: i64 = conn.llen(&self.key).await.map_err(backend)?;
        if depth as usize >= self.capacity {
            return Ok(false);
        }
        let _: i64 = conn.rpush(&self.key, item).await.map_err(backend)?;
        Ok(true)
    }
}

#[async_trait]
impl GridQueue for RedisQueue {
    async fn put(&self, item: Vec<u8>) -> Result<(), GridError> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(self.interrupted());
            }
            if self.offer(&item).await? {
                return Ok(());
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn try_put(&self, item: Vec<u8>) -> Result<bool, GridError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(self.interrupted());
        }
        self.offer(&item).await
    }

    async fn take(&self) -> Result<Vec<u8>, GridError> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(self.interrupted());
            }
            let mut conn = self.pool.get().await.map_err(backend)?;
            // Short server-side timeout so close() is observed promptly and
            // the pooled connection is never parked indefinitely.
            let reply: Option<(String, Vec<u8>)> = redis::cmd("BLPOP")
                .arg(&self.key)
                .arg(1)
                .query_async(&mut conn)
                .await
                .map_err(backend)?;
            if let Some((_, item)) = reply {
                return Ok(item);
            }
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

struct RedisList {
    pool: deadpool_redis::Pool,
    key: String,
}

#[async_trait]
impl GridList for RedisList {
    async fn push(&self, item: Vec<u8>) -> Result<(), GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        let _: i64 = conn.rpush(&self.key, item).await.map_err(backend)?;
        Ok(())
    }

    async fn items(&self) -> Result<Vec<Vec<u8>>, GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        conn.lrange(&self.key, 0, -1).await.map_err(backend)
    }

    async fn clear(&self) -> Result<(), GridError> {
        let mut conn = self.pool.get().await.map_err(backend)?;
        let _: i64 = conn.del(&self.key).await.map_err(backend)?;
        Ok(())
    }
}

struct RedisLock {
    pool: deadpool_redis::Pool,
    name: String,
    key: String,
    ttl_ms: u64,
    retry_delay: Duration,
}

#[async_trait]
impl GridLock for RedisLock {
    async fn acquire(&self) -> Result<LockLease, GridError> {
        let mut conn = self.pool.get().await.map_err(|err| GridError::LockUnavailable {
            name: self.name.clone(),
            reason: err.to_string(),
        })?;
        let token = Uuid::new_v4().to_string();

        loop {
            let granted: Option<String> = redis::cmd("SET")
                .arg(&self.key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(self.ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(|err| GridError::LockUnavailable {
                    name: self.name.clone(),
                    reason: err.to_string(),
                })?;

            if granted.is_some() {
                return Ok(LockLease::new(Box::new(RedisLease {
                    pool: self.pool.clone(),
                    name: self.name.clone(),
                    key: self.key.clone(),
                    token,
                })));
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

/// Releases only when the stored token still matches, so an expired lease
/// cannot delete a successor's grant.
const RELEASE_SCRIPT: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
"#;

struct RedisLease {
    pool: deadpool_redis::Pool,
    name: String,
    key: String,
    token: String,
}

#[async_trait]
impl Lease for RedisLease {
    async fn release(self: Box<Self>) {
        match self.pool.get().await {
            Ok(mut conn) => {
                let released: Result<i64, _> = redis::Script::new(RELEASE_SCRIPT)
                    .key(&self.key)
                    .arg(&self.token)
                    .invoke_async(&mut conn)
                    .await;
                match released {
                    Ok(0) => warn!(lock = self.name.as_str(), "lease expired before release"),
                    Ok(_) => {}
                    Err(err) => {
                        warn!(lock = self.name.as_str(), err = %err, "lock release failed")
                    }
                }
            }
            Err(err) => {
                warn!(lock = self.name.as_str(), err = %err, "no connection to release lock");
            }
        }
    }

    fn lock_name(&self) -> &str {
        &self.name
    }
}
