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

//! Producer side of the distribution protocol: seeds the cluster-shared
//! available-objects queue from a DAO source.

use crate::config::DistroConfig;
use crate::dao::EntityDao;
use crate::entity::Distributable;
use crate::error::DistroError;
use crate::names;
use crate::observability::events;
use flowmesh_grid::{Grid, GridLock, TypedMap, TypedQueue};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "distro_loader";

/// Reads the full entity set from one DAO channel and pushes it into the
/// shared `"<Kind>-available-objects"` queue.
///
/// `load` runs under the cluster-wide `"<Kind>-loader"` lock, so concurrent
/// loaders for the same kind serialize instead of duplicating the queue
/// contents.
pub struct DistroLoader<E: Distributable> {
    grid: Arc<dyn Grid>,
    dao: Arc<dyn EntityDao<E>>,
    available_queue_capacity: usize,
    command_queue_capacity: usize,
}

impl<E: Distributable> DistroLoader<E> {
    pub fn new(
        grid: Arc<dyn Grid>,
        dao: Arc<dyn EntityDao<E>>,
        config: &DistroConfig,
    ) -> Result<Self, DistroError> {
        config.validate()?;
        Ok(Self {
            grid,
            dao,
            available_queue_capacity: config.available_queue_capacity,
            command_queue_capacity: config.command_queue_capacity,
        })
    }

    /// Reads all entities from the DAO and enqueues each one, returning the
    /// count enqueued. Zero is a success, logged distinctly.
    pub async fn load(&self) -> Result<usize, DistroError> {
        let lock = self.grid.lock(&names::loader_lock(E::kind())).await?;
        let lease = lock.acquire().await?;
        let loaded = self.load_locked().await;
        lease.release().await;
        loaded
    }

    async fn load_locked(&self) -> Result<usize, DistroError> {
        let entities = self.dao.find_all().await?;
        let queue = TypedQueue::<E>::open(
            self.grid.as_ref(),
            &names::available_objects_queue(E::kind()),
            self.available_queue_capacity,
        )
        .await?;

        let mut enqueued = 0_usize;
        for entity in &entities {
            queue.put(entity).await?;
            enqueued += 1;
        }

        if enqueued == 0 {
            info!(
                event = events::LOADER_LOAD_EMPTY,
                component = COMPONENT,
                kind = E::kind(),
                source = self.dao.source(),
                "source yielded no entities"
            );
        } else {
            info!(
                event = events::LOADER_LOAD_OK,
                component = COMPONENT,
                kind = E::kind(),
                source = self.dao.source(),
                count = enqueued,
                "entities enqueued for distribution"
            );
        }
        Ok(enqueued)
    }

    /// Broadcast reset: pushes the `"reset"` command onto every registered
    /// manager's private command queue (best-effort; blocked or failed sends
    /// are logged and skipped, not retried), then refills the shared queue.
    pub async fn reset(&self) -> Result<usize, DistroError> {
        info!(
            event = events::LOADER_RESET_START,
            component = COMPONENT,
            kind = E::kind(),
            "broadcasting reset to registered managers"
        );

        let managers =
            TypedMap::<String>::open(self.grid.as_ref(), &names::available_managers_map(E::kind()))
                .await?;

        for (manager_id, kind) in managers.entries().await? {
            let commands = match TypedQueue::<String>::open(
                self.grid.as_ref(),
                &names::command_queue(&manager_id),
                self.command_queue_capacity,
            )
            .await
            {
                Ok(queue) => queue,
                Err(err) => {
                    warn!(
                        event = events::RESET_COMMAND_FAILED,
                        component = COMPONENT,
                        manager_id = manager_id.as_str(),
                        err = %err,
                        "command queue unavailable; skipping manager"
                    );
                    continue;
                }
            };

            match commands.try_put(&names::COMMAND_RESET.to_string()).await {
                Ok(true) => {
                    debug!(
                        event = events::RESET_COMMAND_SENT,
                        component = COMPONENT,
                        manager_id = manager_id.as_str(),
                        manager_kind = kind.as_str(),
                        "reset command sent"
                    );
                }
                Ok(false) => {
                    warn!(
                        event = events::RESET_COMMAND_SKIPPED,
                        component = COMPONENT,
                        manager_id = manager_id.as_str(),
                        "command queue full; skipping manager"
                    );
                }
                Err(err) => {
                    warn!(
                        event = events::RESET_COMMAND_FAILED,
                        component = COMPONENT,
                        manager_id = manager_id.as_str(),
                        err = %err,
                        "reset command send failed; skipping manager"
                    );
                }
            }
        }

        self.load().await
    }
}
