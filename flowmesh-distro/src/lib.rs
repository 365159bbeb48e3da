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

//! # flowmesh-distro
//!
//! The distributed-object-distribution protocol: hands out a finite pool of
//! managed entities to competing cluster members exactly once each, with
//! broadcast reset, on top of the grid primitives from `flowmesh-grid`.
//!
//! - [`DistroLoader`] reads every entity from a [`EntityDao`] channel and
//!   seeds the cluster-shared available-objects queue.
//! - [`DistroManager`], one per cluster member, drains that queue into a
//!   capacity-bounded local cache, announces itself for reset fan-out, and
//!   publishes its size into the cluster-wide registry. Admission is
//!   serialized cluster-wide by the shared `"correlateUpdate"` lock.
//! - [`RegistryWatcher`] republishes registry changes through the routing
//!   core so administrative consumers subscribe like any other component.
//!
//! Grid resource names are derived deterministically from the entity kind
//! (see [`names`]); every member of a cluster must agree on them.
//!
//! Components are built from their required collaborators (grid,
//! distributor, DAO facade) at construction and started with explicit
//! lifecycle hooks; blocking loops run on dedicated worker threads and
//! treat interruption as their terminal signal.

mod config;
pub use config::DistroConfig;

mod dao;
pub use dao::{DaoFacade, EntityDao};

mod entity;
pub use entity::Distributable;

mod error;
pub use error::DistroError;

mod loader;
pub use loader::DistroLoader;

mod manager;
pub use manager::DistroManager;

pub mod names;

#[doc(hidden)]
pub mod observability;

mod registry_events;
pub use registry_events::{RegistryUpdate, RegistryWatcher};
