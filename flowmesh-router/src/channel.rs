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

//! Publisher-facing channel handed to every publishing component.

use crate::interest::Publication;
use crate::message::{Message, Payload, HEADER_SOURCE_COMPONENT};
use crate::routing::MessageDistributor;
use crate::transformer::Transformer;
use std::sync::Arc;

/// One publisher's handle into the routing core. Owns the publisher's
/// [`Publication`] and shares the distributor and transformer with every
/// other channel.
pub struct PubSubChannel {
    publication: Publication,
    distributor: Arc<MessageDistributor>,
    transformer: Arc<Transformer>,
}

impl PubSubChannel {
    pub fn new(
        publication: Publication,
        distributor: Arc<MessageDistributor>,
        transformer: Arc<Transformer>,
    ) -> Self {
        Self {
            publication,
            distributor,
            transformer,
        }
    }

    pub fn publication(&self) -> &Publication {
        &self.publication
    }

    fn stamp(&self, message: Message) -> Message {
        message.with_header(HEADER_SOURCE_COMPONENT, self.publication.owner())
    }

    /// Wraps the payload in a new message and distributes it. `copy = true`
    /// gives each matching subscriber an independently mutable deep copy;
    /// `copy = false` shares one reference across all subscribers, so the
    /// caller asserts no subscriber mutates it unsafely. Returns the number
    /// of subscribers the message was enqueued for.
    pub async fn publish(&self, payload: Box<dyn Payload>, copy: bool) -> usize {
        let message = self.stamp(Message::from_payload(payload));
        self.distributor
            .distribute(&self.publication, message, copy)
            .await
    }

    /// Wraps the whole collection into a single message (one id, multiple
    /// payload entries) so subscribers receive all values together.
    pub async fn publish_all(&self, payloads: Vec<Box<dyn Payload>>, copy: bool) -> usize {
        let message = self.stamp(Message::new(
            payloads.into_iter().map(Arc::from).collect(),
        ));
        self.distributor
            .distribute(&self.publication, message, copy)
            .await
    }

    /// Optionally publishes the original payload first, then publishes every
    /// registered alternate representation of its type with the same copy
    /// semantics.
    pub async fn transform_publish(
        &self,
        payload: Box<dyn Payload>,
        copy: bool,
        publish_original: bool,
    ) -> usize {
        let payload: Arc<dyn Payload> = Arc::from(payload);
        let mut delivered = 0_usize;

        if publish_original {
            let message = self.stamp(Message::new(vec![payload.clone()]));
            delivered += self
                .distributor
                .distribute(&self.publication, message, copy)
                .await;
        }

        delivered += self
            .transformer
            .transform_and_publish(payload.as_ref(), copy, &self.publication, &self.distributor)
            .await;
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::PubSubChannel;
    use crate::filter::{MatchType, TypeFilter};
    use crate::interest::{Publication, Subscription};
    use crate::message::{Message, Payload, HEADER_SOURCE_COMPONENT};
    use crate::routing::MessageDistributor;
    use crate::transformer::Transformer;
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

    async fn channel_with_listener() -> (PubSubChannel, Arc<RecordingListener>) {
        let distributor = Arc::new(MessageDistributor::new(8));
        let transformer = Arc::new(Transformer::new());
        let listener = RecordingListener::new();

        distributor
            .register(
                Subscription::new("viewer", "everything")
                    .with_filter(TypeFilter::new(MatchType::Any).with::<String>())
                    .with_filter(TypeFilter::new(MatchType::Any).with::<i64>()),
                listener.clone(),
            )
            .await
            .expect("registration should succeed");

        let channel = PubSubChannel::new(
            Publication::new("archiver", "out"),
            distributor,
            transformer,
        );
        (channel, listener)
    }

    #[tokio::test]
    async fn publish_stamps_source_component_header() {
        let (channel, listener) = channel_with_listener().await;

        let delivered = channel.publish(Box::new("hello".to_string()), false).await;
        assert_eq!(delivered, 1);

        let received = listener.wait_for(1).await;
        assert_eq!(received[0].header(HEADER_SOURCE_COMPONENT), Some("archiver"));
    }

    #[tokio::test]
    async fn publish_all_delivers_one_message_with_all_values() {
        let (channel, listener) = channel_with_listener().await;

        let payloads: Vec<Box<dyn Payload>> = vec![
            Box::new("x".to_string()),
            Box::new("y".to_string()),
            Box::new("z".to_string()),
        ];
        let delivered = channel.publish_all(payloads, true).await;
        assert_eq!(delivered, 1);

        let received = listener.wait_for(1).await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].payloads_of::<String>(), vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn transform_publish_publishes_original_then_derived() {
        let (channel, listener) = channel_with_listener().await;
        channel
            .transformer
            .register::<String, _>(|text| Box::new(text.len() as i64));

        let delivered = channel
            .transform_publish(Box::new("hello".to_string()), false, true)
            .await;
        assert_eq!(delivered, 2);

        let received = listener.wait_for(2).await;
        assert_eq!(received[0].payloads_of::<String>(), vec!["hello"]);
        assert_eq!(received[1].payloads_of::<i64>(), vec![&5]);
    }

    #[tokio::test]
    async fn transform_publish_can_skip_original() {
        let (channel, listener) = channel_with_listener().await;
        channel
            .transformer
            .register::<String, _>(|text| Box::new(text.len() as i64));

        let delivered = channel
            .transform_publish(Box::new("hello".to_string()), false, false)
            .await;
        assert_eq!(delivered, 1);

        let received = listener.wait_for(1).await;
        assert_eq!(received[0].payloads_of::<i64>(), vec![&5]);
    }
}
