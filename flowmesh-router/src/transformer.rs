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

//! Registry of per-type transforms for derive-and-republish publishing.

use crate::interest::Publication;
use crate::message::{Message, Payload, TypeKey, HEADER_SOURCE_COMPONENT};
use crate::observability::events;
use crate::routing::MessageDistributor;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

const COMPONENT: &str = "transformer";

type TransformFn = Arc<dyn Fn(&dyn Payload) -> Option<Box<dyn Payload>> + Send + Sync>;

/// Type-keyed table of transform functions. Each entry derives one alternate
/// representation of a payload; publishing applies every entry registered
/// for the payload's runtime type.
pub struct Transformer {
    transforms: RwLock<HashMap<TypeKey, Vec<TransformFn>>>,
}

impl Transformer {
    pub fn new() -> Self {
        Self {
            transforms: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a transform from source type `S`. Several transforms may be
    /// registered for the same source type; each produces one publication.
    pub fn register<S, F>(&self, transform: F)
    where
        S: 'static,
        F: Fn(&S) -> Box<dyn Payload> + Send + Sync + 'static,
    {
        let erased: TransformFn = Arc::new(move |payload| {
            payload
                .as_any()
                .downcast_ref::<S>()
                .map(|typed| transform(typed))
        });

        let mut transforms = self
            .transforms
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transforms.entry(TypeKey::of::<S>()).or_default().push(erased);
    }

    fn transforms_for(&self, key: TypeKey) -> Vec<TransformFn> {
        let transforms = self
            .transforms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transforms.get(&key).cloned().unwrap_or_default()
    }

    /// Applies every transform registered for the payload's runtime type and
    /// publishes each derived representation through the distributor under
    /// the given publication, with the caller's copy semantics. An absent
    /// registration is a silent no-op. Returns the number of deliveries.
    pub async fn transform_and_publish(
        &self,
        payload: &dyn Payload,
        copy: bool,
        publication: &Publication,
        distributor: &MessageDistributor,
    ) -> usize {
        let source_tag = payload.type_tag();
        let entries = self.transforms_for(source_tag.key());
        if entries.is_empty() {
            debug!(
                event = events::TRANSFORM_NONE_REGISTERED,
                component = COMPONENT,
                source_type = source_tag.key().name(),
                "no transform registered"
            );
            return 0;
        }

        let mut delivered = 0_usize;
        for entry in entries {
            let Some(derived) = entry(payload) else {
                continue;
            };
            let derived_tag = derived.type_tag();
            let message = Message::from_payload(derived)
                .with_header(HEADER_SOURCE_COMPONENT, publication.owner());
            delivered += distributor.distribute(publication, message, copy).await;
            debug!(
                event = events::TRANSFORM_APPLIED,
                component = COMPONENT,
                source_type = source_tag.key().name(),
                derived_type = derived_tag.key().name(),
                "published transformed representation"
            );
        }
        delivered
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Transformer;
    use crate::filter::{MatchType, TypeFilter};
    use crate::interest::{Publication, Subscription};
    use crate::message::{Message, Payload};
    use crate::routing::MessageDistributor;
    use crate::{MessageListener, RouterError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct RecordingListener {
        received: Mutex<Vec<Message>>,
    }

    impl RecordingListener {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
            })
        }

        async fn wait_for(&self, count: usize) -> Vec<Message> {
            for _ in 0..500 {
                {
                    let received = self.received.lock().await;
                    if received.len() >= count {
                        return received.clone();
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            panic!("timed out waiting for {count} messages");
        }
    }

    #[async_trait]
    impl MessageListener for RecordingListener {
        async fn on_message(&self, message: Message) -> Result<(), RouterError> {
            self.received.lock().await.push(message);
            Ok(())
        }
    }

    #[tokio::test]
    async fn absent_registration_is_a_silent_no_op() {
        let transformer = Transformer::new();
        let distributor = MessageDistributor::new(8);
        let publication = Publication::new("publisher", "out");

        let payload: Box<dyn Payload> = Box::new("hello".to_string());
        let delivered = transformer
            .transform_and_publish(payload.as_ref(), false, &publication, &distributor)
            .await;

        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn registered_transforms_publish_derived_representations() {
        let transformer = Transformer::new();
        transformer.register::<String, _>(|text| Box::new(text.len() as i64));
        transformer.register::<String, _>(|text| Box::new(text.to_uppercase()));

        let distributor = MessageDistributor::new(8);
        let listener = RecordingListener::new();
        distributor
            .register(
                Subscription::new("viewer", "derived")
                    .with_filter(TypeFilter::new(MatchType::Any).with::<i64>())
                    .with_filter(TypeFilter::new(MatchType::Any).with::<String>()),
                listener.clone(),
            )
            .await
            .expect("registration should succeed");

        let publication = Publication::new("publisher", "out");
        let payload: Box<dyn Payload> = Box::new("hello".to_string());
        let delivered = transformer
            .transform_and_publish(payload.as_ref(), false, &publication, &distributor)
            .await;

        assert_eq!(delivered, 2);
        let received = listener.wait_for(2).await;
        let lengths: Vec<i64> = received
            .iter()
            .flat_map(|message| message.payloads_of::<i64>())
            .copied()
            .collect();
        let texts: Vec<String> = received
            .iter()
            .flat_map(|message| message.payloads_of::<String>())
            .cloned()
            .collect();
        assert_eq!(lengths, vec![5]);
        assert_eq!(texts, vec!["HELLO"]);
    }

    #[tokio::test]
    async fn transforms_for_other_types_are_not_applied() {
        let transformer = Transformer::new();
        transformer.register::<i64, _>(|value| Box::new(value.to_string()));

        let distributor = MessageDistributor::new(8);
        let publication = Publication::new("publisher", "out");

        let payload: Box<dyn Payload> = Box::new("hello".to_string());
        let delivered = transformer
            .transform_and_publish(payload.as_ref(), false, &publication, &distributor)
            .await;

        assert_eq!(delivered, 0);
    }
}
