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

//! DAO collaborator seam and the capability registry that selects one.

use crate::entity::Distributable;
use crate::error::DistroError;
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Data-access channel bound to one source for one entity type.
#[async_trait]
pub trait EntityDao<E: Distributable>: Send + Sync {
    /// Identity of the data source this channel reads from.
    fn source(&self) -> &str;

    /// Reads the full entity set from the source.
    async fn find_all(&self) -> Result<Vec<E>, DistroError>;
}

/// Capability registry of DAO channels, keyed by (entity type, source).
///
/// The host registers every channel at wiring time; components ask for a
/// repository by entity type and source and receive
/// [`DistroError::UnsupportedEntity`] when no registered channel supports
/// the combination.
#[derive(Default)]
pub struct DaoFacade {
    repositories: HashMap<(TypeId, String), Box<dyn Any + Send + Sync>>,
}

impl DaoFacade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: Distributable>(&mut self, dao: Arc<dyn EntityDao<E>>) {
        self.repositories
            .insert((TypeId::of::<E>(), dao.source().to_string()), Box::new(dao));
    }

    pub fn supports<E: Distributable>(&self, source: &str) -> bool {
        self.repositories
            .contains_key(&(TypeId::of::<E>(), source.to_string()))
    }

    pub fn repository<E: Distributable>(
        &self,
        source: &str,
    ) -> Result<Arc<dyn EntityDao<E>>, DistroError> {
        self.repositories
            .get(&(TypeId::of::<E>(), source.to_string()))
            .and_then(|entry| entry.downcast_ref::<Arc<dyn EntityDao<E>>>())
            .cloned()
            .ok_or_else(|| DistroError::UnsupportedEntity {
                kind: E::kind().to_string(),
                source: source.to_string(),
            })
    }
}
