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

//! Message envelope, payload trait, and the runtime-type identity model.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Header stamped by [`PubSubChannel`](crate::PubSubChannel) with the owner
/// of the publishing component.
pub const HEADER_SOURCE_COMPONENT: &str = "source-component";

/// Identity of one payload runtime type: `TypeId` plus a display name.
///
/// Equality and hashing use the `TypeId` only; the name exists for logs and
/// diagnostics.
#[derive(Clone, Copy, Debug, Eq)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn short_type_name<T: 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// A payload type's key plus its declared supertype keys.
///
/// The supertype list is an explicit table the payload type provides at tag
/// construction; covariant filter matching consults it instead of any runtime
/// reflection.
#[derive(Clone, Debug)]
pub struct TypeTag {
    key: TypeKey,
    supertypes: Vec<TypeKey>,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            supertypes: Vec::new(),
        }
    }

    /// Declares covariant ancestors: a filter holding any of these keys also
    /// accepts this tag.
    pub fn with_supertypes(mut self, supertypes: Vec<TypeKey>) -> Self {
        self.supertypes = supertypes;
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    /// True when a value tagged `other` can stand in for this type: exact
    /// key identity fast-path, then the probe's declared supertype table.
    pub fn is_assignable_from(&self, other: &TypeTag) -> bool {
        self.key == other.key || other.supertypes.contains(&self.key)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeTag {}

/// A typed message payload value.
///
/// Payloads are held behind `Arc` inside messages; `clone_payload` is the
/// deep-copy path used when a publisher asks for independently mutable
/// deliveries.
pub trait Payload: Any + Send + Sync + fmt::Debug {
    fn type_tag(&self) -> TypeTag;
    fn clone_payload(&self) -> Box<dyn Payload>;
    fn as_any(&self) -> &dyn Any;
}

macro_rules! plain_payload {
    ($ty:ty) => {
        impl Payload for $ty {
            fn type_tag(&self) -> TypeTag {
                TypeTag::of::<$ty>()
            }

            fn clone_payload(&self) -> Box<dyn Payload> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

plain_payload!(String);
plain_payload!(i64);
plain_payload!(f64);
plain_payload!(Vec<u8>);

/// Immutable-identity envelope carrying an ordered collection of typed
/// payload values plus string headers.
///
/// The identifier is assigned once at construction and never mutated; only
/// [`Message::deep_copy`] produces a new identifier, preserving an
/// original-id linkage back to the source message.
#[derive(Clone)]
pub struct Message {
    id: Uuid,
    original_id: Uuid,
    headers: HashMap<String, String>,
    payloads: Vec<Arc<dyn Payload>>,
    type_tags: Vec<TypeTag>,
}

impl Message {
    pub fn new(payloads: Vec<Arc<dyn Payload>>) -> Self {
        let id = Uuid::new_v4();
        let type_tags = distinct_tags(&payloads);
        Self {
            id,
            original_id: id,
            headers: HashMap::new(),
            payloads,
            type_tags,
        }
    }

    pub fn from_payload(payload: Box<dyn Payload>) -> Self {
        Self::new(vec![Arc::from(payload)])
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Equals [`Message::id`] unless this message is a copy, in which case it
    /// references the id of the message it was copied from.
    pub fn original_id(&self) -> Uuid {
        self.original_id
    }

    pub fn is_copy(&self) -> bool {
        self.id != self.original_id
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn payloads(&self) -> &[Arc<dyn Payload>] {
        &self.payloads
    }

    /// Downcast view of every payload entry of type `T`, in payload order.
    pub fn payloads_of<T: 'static>(&self) -> Vec<&T> {
        self.payloads
            .iter()
            .filter_map(|payload| payload.as_any().downcast_ref::<T>())
            .collect()
    }

    /// The distinct payload runtime types, cached at construction. Type
    /// filters probe this instead of rescanning payload entries.
    pub fn type_tags(&self) -> &[TypeTag] {
        &self.type_tags
    }

    /// Deep copy: new identity, original-id linkage to this message, payload
    /// values cloned so the copy is independently mutable.
    pub fn deep_copy(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_id: self.id,
            headers: self.headers.clone(),
            payloads: self
                .payloads
                .iter()
                .map(|payload| Arc::from(payload.clone_payload()))
                .collect(),
            type_tags: self.type_tags.clone(),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("original_id", &self.original_id)
            .field("payloads", &self.payloads.len())
            .finish()
    }
}

fn distinct_tags(payloads: &[Arc<dyn Payload>]) -> Vec<TypeTag> {
    let mut tags: Vec<TypeTag> = Vec::new();
    for payload in payloads {
        let tag = payload.type_tag();
        if !tags.iter().any(|seen| seen.key() == tag.key()) {
            tags.push(tag);
        }
    }
    tags
}
