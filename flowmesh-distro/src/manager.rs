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

//! Consumer side of the distribution protocol: a bounded-capacity manager
//! that drains its share of the cluster entity pool into a local cache.

use crate::config::DistroConfig;
use crate::entity::Distributable;
use crate::error::DistroError;
use crate::names;
use crate::observability::events;
use async_trait::async_trait;
use flowmesh_grid::{Grid, GridError, GridLock, TypedMap, TypedQueue};
use flowmesh_router::runtime::worker_runtime::{build_thread_name, spawn_consume_loop};
use flowmesh_router::{
    MatchType, Message, MessageDistributor, MessageListener, RouterError, Subscription, TypeFilter,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "distro_manager";
const LOADER_THREAD_PREFIX: &str = "fm-load-";
const COMMAND_THREAD_PREFIX: &str = "fm-cmd-";
const WORKER_THREAD_NAME_MAX_LEN: usize = 15;
const SUBSCRIPTION_NAME: &str = "live-updates";

/// One cluster member's share of a distributed entity pool.
///
/// Lifecycle: `Starting → Loading → Ready`. On [`DistroManager::start`] the
/// manager announces itself in the shared availability map, publishes size
/// zero into the distro registry, and spawns two dedicated worker threads:
/// a loader loop draining the shared available-objects queue up to capacity
/// and a command loop serving the private command queue. There is no
/// explicit terminal state; [`DistroManager::shutdown`] is the host's
/// pre-destruction hook and tears down local state only. Items already
/// consumed are not returned to the shared queue.
pub struct DistroManager<E: Distributable> {
    core: Arc<ManagerCore<E>>,
}

struct ManagerCore<E: Distributable> {
    id: String,
    capacity: usize,
    available_queue_capacity: usize,
    command_queue_capacity: usize,
    grid: Arc<dyn Grid>,
    distributor: Arc<MessageDistributor>,
    cache: Mutex<HashMap<E::Id, E>>,
    size: AtomicUsize,
    ready: AtomicBool,
    stopping: AtomicBool,
    stop: Notify,
    loader_active: AtomicBool,
    command_queue: OnceLock<TypedQueue<String>>,
}

impl<E: Distributable> DistroManager<E> {
    /// Builds a manager from its required collaborators. Configuration is
    /// validated eagerly; an unstarted manager spawns nothing.
    pub fn new(
        grid: Arc<dyn Grid>,
        distributor: Arc<MessageDistributor>,
        config: &DistroConfig,
    ) -> Result<Self, DistroError> {
        config.validate()?;
        Ok(Self {
            core: Arc::new(ManagerCore {
                id: Uuid::new_v4().to_string(),
                capacity: config.capacity,
                available_queue_capacity: config.available_queue_capacity,
                command_queue_capacity: config.command_queue_capacity,
                grid,
                distributor,
                cache: Mutex::new(HashMap::new()),
                size: AtomicUsize::new(0),
                ready: AtomicBool::new(false),
                stopping: AtomicBool::new(false),
                stop: Notify::new(),
                loader_active: AtomicBool::new(false),
                command_queue: OnceLock::new(),
            }),
        })
    }

    pub fn manager_id(&self) -> &str {
        &self.core.id
    }

    /// Current local cache size.
    pub fn size(&self) -> usize {
        self.core.size.load(Ordering::Acquire)
    }

    /// Set once the local cache has reached capacity.
    pub fn is_ready(&self) -> bool {
        self.core.ready.load(Ordering::Acquire)
    }

    /// The live-update interest this manager registers with the routing
    /// core: a type filter for its managed entity type.
    pub fn subscription(&self) -> Subscription {
        Subscription::new(&self.core.id, SUBSCRIPTION_NAME)
            .with_filter(TypeFilter::new(MatchType::Any).with::<E>())
    }

    /// Post-construction hook: announce presence, publish initial size,
    /// register the live-update subscription, and start the worker loops.
    pub async fn start(&self) -> Result<(), DistroError> {
        let core = &self.core;

        let managers = TypedMap::<String>::open(
            core.grid.as_ref(),
            &names::available_managers_map(E::kind()),
        )
        .await?;
        managers.put(&core.id, &E::kind().to_string()).await?;

        let registry = TypedMap::<usize>::open(core.grid.as_ref(), names::DISTRO_REGISTRY_MAP)
            .await?;
        registry.put(&core.id, &0).await?;

        core.distributor
            .register(self.subscription(), Arc::new(LiveUpdateListener {
                core: core.clone(),
            }))
            .await
            .map_err(|err| DistroError::Routing(err.to_string()))?;

        let commands = TypedQueue::<String>::open(
            core.grid.as_ref(),
            &names::command_queue(&core.id),
            core.command_queue_capacity,
        )
        .await?;
        // First start wins; start is not expected to run twice.
        let _ = core.command_queue.set(commands.clone());

        info!(
            event = events::MANAGER_ANNOUNCE,
            component = COMPONENT,
            manager_id = core.id.as_str(),
            kind = E::kind(),
            capacity = core.capacity,
            "manager announced"
        );

        if core.size.load(Ordering::Acquire) < core.capacity {
            ManagerCore::spawn_loader(core);
        }
        ManagerCore::spawn_command_loop(core, commands);
        Ok(())
    }

    /// Pre-destruction hook: deregisters from the shared maps, removes the
    /// live-update subscription, and signals both worker loops to stop.
    pub async fn shutdown(&self) {
        let core = &self.core;
        core.stopping.store(true, Ordering::Release);
        core.stop.notify_one();
        if let Some(commands) = core.command_queue.get() {
            commands.close();
        }

        if let Ok(managers) = TypedMap::<String>::open(
            core.grid.as_ref(),
            &names::available_managers_map(E::kind()),
        )
        .await
        {
            if let Err(err) = managers.remove(&core.id).await {
                warn!(
                    component = COMPONENT,
                    manager_id = core.id.as_str(),
                    err = %err,
                    "manager deregistration failed"
                );
            }
        }
        if let Ok(registry) =
            TypedMap::<usize>::open(core.grid.as_ref(), names::DISTRO_REGISTRY_MAP).await
        {
            if let Err(err) = registry.remove(&core.id).await {
                warn!(
                    component = COMPONENT,
                    manager_id = core.id.as_str(),
                    err = %err,
                    "registry deregistration failed"
                );
            }
        }
        if let Err(err) = core
            .distributor
            .unregister(&core.id, SUBSCRIPTION_NAME)
            .await
        {
            warn!(
                component = COMPONENT,
                manager_id = core.id.as_str(),
                err = %err,
                "live-update unsubscription failed"
            );
        }

        info!(
            event = events::MANAGER_SHUTDOWN,
            component = COMPONENT,
            manager_id = core.id.as_str(),
            "manager shut down"
        );
    }

    /// Snapshot read of one cached entity.
    pub async fn cached(&self, id: &E::Id) -> Option<E> {
        self.core.cache.lock().await.get(id).cloned()
    }

    /// Typed read of the cluster-wide size registry for administrative
    /// consumers.
    pub async fn registry_sizes(&self) -> Result<Vec<(String, usize)>, DistroError> {
        let registry =
            TypedMap::<usize>::open(self.core.grid.as_ref(), names::DISTRO_REGISTRY_MAP).await?;
        Ok(registry.entries().await?)
    }
}

impl<E: Distributable> ManagerCore<E> {
    fn spawn_loader(core: &Arc<Self>) {
        if core
            .loader_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(
                event = events::LOADER_STILL_ACTIVE,
                component = COMPONENT,
                manager_id = core.id.as_str(),
                "loader loop already running"
            );
            return;
        }

        let loop_core = core.clone();
        let thread_name =
            build_thread_name(LOADER_THREAD_PREFIX, &core.id, WORKER_THREAD_NAME_MAX_LEN);
        spawn_consume_loop(thread_name, move || async move {
            loop_core.run_loader_loop().await;
        });
    }

    fn spawn_command_loop(core: &Arc<Self>, commands: TypedQueue<String>) {
        let loop_core = core.clone();
        let thread_name =
            build_thread_name(COMMAND_THREAD_PREFIX, &core.id, WORKER_THREAD_NAME_MAX_LEN);
        spawn_consume_loop(thread_name, move || async move {
            loop_core.run_command_loop(commands).await;
        });
    }

    /// Loader loop: blocking-take one entity at a time from the shared
    /// queue and admit it under the cluster-wide admission lock, until the
    /// local cache reaches capacity. Interruption is terminal.
    async fn run_loader_loop(self: Arc<Self>) {
        let queue = match TypedQueue::<E>::open(
            self.grid.as_ref(),
            &names::available_objects_queue(E::kind()),
            self.available_queue_capacity,
        )
        .await
        {
            Ok(queue) => queue,
            Err(err) => {
                warn!(
                    component = COMPONENT,
                    manager_id = self.id.as_str(),
                    err = %err,
                    "available-objects queue unavailable; loader not started"
                );
                self.loader_active.store(false, Ordering::Release);
                return;
            }
        };
        let admission_lock = match self.grid.lock(names::CORRELATE_UPDATE_LOCK).await {
            Ok(lock) => lock,
            Err(err) => {
                warn!(
                    event = events::ADMISSION_LOCK_UNAVAILABLE,
                    component = COMPONENT,
                    manager_id = self.id.as_str(),
                    err = %err,
                    "admission lock unavailable; loader not started"
                );
                self.loader_active.store(false, Ordering::Release);
                return;
            }
        };
        let registry = match TypedMap::<usize>::open(self.grid.as_ref(), names::DISTRO_REGISTRY_MAP)
            .await
        {
            Ok(registry) => registry,
            Err(err) => {
                warn!(
                    event = events::REGISTRY_PUBLISH_FAILED,
                    component = COMPONENT,
                    manager_id = self.id.as_str(),
                    err = %err,
                    "registry unavailable; loader not started"
                );
                self.loader_active.store(false, Ordering::Release);
                return;
            }
        };

        let mut reached_capacity = false;
        while self.size.load(Ordering::Acquire) < self.capacity {
            if self.stopping.load(Ordering::Acquire) {
                info!(
                    event = events::LOADER_STOPPED,
                    component = COMPONENT,
                    manager_id = self.id.as_str(),
                    "stop requested; ending loader loop"
                );
                break;
            }

            let entity = tokio::select! {
                taken = queue.take() => match taken {
                    Ok(entity) => entity,
                    Err(GridError::Interrupted { .. }) => {
                        warn!(
                            event = events::LOADER_TAKE_INTERRUPTED,
                            component = COMPONENT,
                            manager_id = self.id.as_str(),
                            "queue take interrupted; ending loader loop"
                        );
                        break;
                    }
                    Err(err) => {
                        warn!(
                            component = COMPONENT,
                            manager_id = self.id.as_str(),
                            err = %err,
                            "queue take failed; ending loader loop"
                        );
                        break;
                    }
                },
                _ = self.stop.notified() => {
                    info!(
                        event = events::LOADER_STOPPED,
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        "stop requested; ending loader loop"
                    );
                    break;
                }
            };

            match admission_lock.acquire().await {
                Ok(lease) => {
                    let size = self.admit(entity, &registry).await;
                    lease.release().await;
                    if size >= self.capacity {
                        reached_capacity = true;
                    }
                }
                Err(err) => {
                    warn!(
                        event = events::ADMISSION_LOCK_UNAVAILABLE,
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        err = %err,
                        "admission lock acquisition failed; ending loader loop"
                    );
                    break;
                }
            }
        }

        if self.size.load(Ordering::Acquire) >= self.capacity {
            reached_capacity = true;
            self.ready.store(true, Ordering::Release);
            info!(
                event = events::MANAGER_READY,
                component = COMPONENT,
                manager_id = self.id.as_str(),
                capacity = self.capacity,
                "local cache at capacity"
            );
        }

        self.loader_active.store(false, Ordering::Release);
        // A reset that lands while this loop is exiting would find no loader
        // running; restart when the cache emptied again mid-exit.
        if reached_capacity
            && !self.stopping.load(Ordering::Acquire)
            && self.size.load(Ordering::Acquire) < self.capacity
        {
            Self::spawn_loader(&self);
        }
    }

    /// Inserts one entity into the local cache and republishes the new size
    /// into the shared registry. Caller holds the admission lock.
    async fn admit(&self, entity: E, registry: &TypedMap<usize>) -> usize {
        let entity_id = entity.id();
        let size = {
            let mut cache = self.cache.lock().await;
            cache.insert(entity_id.clone(), entity);
            cache.len()
        };
        self.size.store(size, Ordering::Release);

        debug!(
            event = events::MANAGER_ADMIT,
            component = COMPONENT,
            manager_id = self.id.as_str(),
            entity_id = %entity_id,
            size,
            "entity admitted"
        );

        if let Err(err) = registry.put(&self.id, &size).await {
            warn!(
                event = events::REGISTRY_PUBLISH_FAILED,
                component = COMPONENT,
                manager_id = self.id.as_str(),
                err = %err,
                "size publication failed"
            );
        }
        size
    }

    /// Command loop: serves the private command queue until it closes.
    /// Unrecognized commands are ignored.
    async fn run_command_loop(self: Arc<Self>, commands: TypedQueue<String>) {
        loop {
            match commands.take().await {
                Ok(command) if command == names::COMMAND_RESET => {
                    info!(
                        event = events::COMMAND_RESET_RECEIVED,
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        "reset command received"
                    );
                    self.reset().await;
                }
                Ok(command) => {
                    debug!(
                        event = events::COMMAND_IGNORED,
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        command = command.as_str(),
                        "unrecognized command ignored"
                    );
                }
                Err(GridError::Interrupted { .. }) => {
                    warn!(
                        event = events::COMMAND_INTERRUPTED,
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        "command take interrupted; ending command loop"
                    );
                    break;
                }
                Err(err) => {
                    warn!(
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        err = %err,
                        "command take failed; ending command loop"
                    );
                    break;
                }
            }
        }
    }

    /// Clears the local cache, republishes size zero, and restarts the
    /// loader when below capacity.
    async fn reset(self: &Arc<Self>) {
        {
            let mut cache = self.cache.lock().await;
            cache.clear();
        }
        self.size.store(0, Ordering::Release);
        self.ready.store(false, Ordering::Release);

        match TypedMap::<usize>::open(self.grid.as_ref(), names::DISTRO_REGISTRY_MAP).await {
            Ok(registry) => {
                if let Err(err) = registry.put(&self.id, &0).await {
                    warn!(
                        event = events::REGISTRY_PUBLISH_FAILED,
                        component = COMPONENT,
                        manager_id = self.id.as_str(),
                        err = %err,
                        "zero-size publication failed"
                    );
                }
            }
            Err(err) => {
                warn!(
                    event = events::REGISTRY_PUBLISH_FAILED,
                    component = COMPONENT,
                    manager_id = self.id.as_str(),
                    err = %err,
                    "registry unavailable"
                );
            }
        }

        info!(
            event = events::MANAGER_RESET,
            component = COMPONENT,
            manager_id = self.id.as_str(),
            "local cache cleared"
        );

        if !self.stopping.load(Ordering::Acquire)
            && self.size.load(Ordering::Acquire) < self.capacity
        {
            Self::spawn_loader(self);
        }
    }
}

/// Live-update side of the manager: refreshes a cached entity in place when
/// a routed message carries a newer value for an id already cached.
/// Admission of new ids stays with the lock-serialized queue protocol.
struct LiveUpdateListener<E: Distributable> {
    core: Arc<ManagerCore<E>>,
}

#[async_trait]
impl<E: Distributable> MessageListener for LiveUpdateListener<E> {
    async fn on_message(&self, message: Message) -> Result<(), RouterError> {
        for entity in message.payloads_of::<E>() {
            let entity_id = entity.id();
            let mut cache = self.core.cache.lock().await;
            if cache.contains_key(&entity_id) {
                cache.insert(entity_id.clone(), entity.clone());
                debug!(
                    event = events::LIVE_UPDATE_APPLIED,
                    component = COMPONENT,
                    manager_id = self.core.id.as_str(),
                    entity_id = %entity_id,
                    "cached entity refreshed"
                );
            }
        }
        Ok(())
    }
}
