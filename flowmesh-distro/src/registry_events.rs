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

//! Bridges distro-registry map changes into the routing core: one loop
//! consumes the map's watch stream and republishes each change as a normal
//! message, so registry consumers subscribe through the same path as any
//! other component.

use crate::error::DistroError;
use crate::names;
use crate::observability::events;
use flowmesh_grid::{Grid, GridMap, MapEvent, MapEventKind};
use flowmesh_router::runtime::worker_runtime::spawn_consume_loop;
use flowmesh_router::{Payload, PubSubChannel, TypeTag};
use std::any::Any;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info};

const COMPONENT: &str = "registry_watcher";
const WATCH_THREAD_NAME: &str = "fm-reg-watch";

/// One change to the cluster-wide size registry, published as a payload.
#[derive(Clone, Debug)]
pub struct RegistryUpdate {
    pub change: MapEventKind,
    pub manager_id: String,
    /// Present for added/updated entries; absent for removals and entries
    /// whose registry value could not be decoded.
    pub size: Option<usize>,
}

impl RegistryUpdate {
    fn from_event(event: MapEvent) -> Self {
        let size = event
            .value
            .as_deref()
            .and_then(|bytes| serde_json::from_slice(bytes).ok());
        Self {
            change: event.kind,
            manager_id: event.key,
            size,
        }
    }
}

impl Payload for RegistryUpdate {
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<RegistryUpdate>()
    }

    fn clone_payload(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Watches the `"distroRegistry"` map and republishes every entry change
/// through the given channel. The loop runs on its own worker thread and
/// ends quietly when the watch stream closes.
pub struct RegistryWatcher;

impl RegistryWatcher {
    pub async fn start(grid: &dyn Grid, channel: PubSubChannel) -> Result<(), DistroError> {
        let registry = grid.map(names::DISTRO_REGISTRY_MAP).await?;
        let receiver = registry.watch().await?;

        spawn_consume_loop(WATCH_THREAD_NAME.to_string(), move || async move {
            Self::run_watch_loop(channel, receiver).await;
        });
        Ok(())
    }

    async fn run_watch_loop(channel: PubSubChannel, mut receiver: Receiver<MapEvent>) {
        while let Some(event) = receiver.recv().await {
            let update = RegistryUpdate::from_event(event);
            let manager_id = update.manager_id.clone();
            let delivered = channel.publish(Box::new(update), true).await;
            debug!(
                event = events::REGISTRY_EVENT_PUBLISHED,
                component = COMPONENT,
                manager_id = manager_id.as_str(),
                delivered,
                "registry change republished"
            );
        }

        info!(
            event = events::REGISTRY_WATCH_CLOSED,
            component = COMPONENT,
            "registry watch stream closed; stopping"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::RegistryUpdate;
    use flowmesh_grid::{MapEvent, MapEventKind};

    #[test]
    fn from_event_decodes_sizes() {
        let update = RegistryUpdate::from_event(MapEvent {
            kind: MapEventKind::Updated,
            key: "manager-1".to_string(),
            value: Some(b"3".to_vec()),
        });

        assert_eq!(update.change, MapEventKind::Updated);
        assert_eq!(update.manager_id, "manager-1");
        assert_eq!(update.size, Some(3));
    }

    #[test]
    fn from_event_tolerates_removals_and_bad_values() {
        let removed = RegistryUpdate::from_event(MapEvent {
            kind: MapEventKind::Removed,
            key: "manager-1".to_string(),
            value: None,
        });
        assert_eq!(removed.size, None);

        let undecodable = RegistryUpdate::from_event(MapEvent {
            kind: MapEventKind::Added,
            key: "manager-2".to_string(),
            value: Some(b"not-a-number".to_vec()),
        });
        assert_eq!(undecodable.size, None);
    }
}
