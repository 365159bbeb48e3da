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

//! Subscription registry and the message-distribution policy.

use crate::filter::Filter;
use crate::interest::{Publication, Subscription};
use crate::message::Message;
use crate::observability::{events, fields};
use crate::routing::DispatchWorker;
use crate::{MessageListener, RouterError};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

const COMPONENT: &str = "distributor";

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct SubscriptionKey {
    owner: String,
    name: String,
}

impl SubscriptionKey {
    fn of(subscription: &Subscription) -> Self {
        Self {
            owner: subscription.owner().to_string(),
            name: subscription.name().to_string(),
        }
    }
}

/// One registered subscriber: its interest set, its bounded delivery queue,
/// and the worker draining that queue.
struct SubscriberBinding {
    subscription: Subscription,
    sender: Sender<Message>,
    _worker: DispatchWorker,
}

type BindingMap = HashMap<SubscriptionKey, Arc<SubscriberBinding>>;

/// Matches outgoing messages against every registered subscription and
/// delivers copies or shared references.
///
/// The registry is published as a copy-on-write snapshot: the hot
/// distribute path loads it lock-free, while registrations serialize on a
/// mutation guard.
pub struct MessageDistributor {
    delivery_queue_size: usize,
    bindings: ArcSwap<BindingMap>,
    mutation_guard: Mutex<()>,
}

impl MessageDistributor {
    /// Creates a distributor whose per-subscriber delivery queues hold
    /// `delivery_queue_size` messages before publishers block.
    pub fn new(delivery_queue_size: usize) -> Self {
        Self {
            delivery_queue_size: delivery_queue_size.max(1),
            bindings: ArcSwap::from_pointee(HashMap::new()),
            mutation_guard: Mutex::new(()),
        }
    }

    /// Registers a subscription with the listener that receives its
    /// deliveries. Spawns the subscriber's dispatch worker.
    pub async fn register(
        &self,
        subscription: Subscription,
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), RouterError> {
        let _guard = self.mutation_guard.lock().await;
        let key = SubscriptionKey::of(&subscription);

        let current = self.bindings.load();
        if current.contains_key(&key) {
            warn!(
                event = events::SUBSCRIPTION_REGISTER_DUPLICATE,
                component = COMPONENT,
                owner = key.owner.as_str(),
                name = key.name.as_str(),
                "subscription already registered"
            );
            return Err(RouterError::AlreadyRegistered {
                owner: key.owner,
                name: key.name,
            });
        }

        let (sender, receiver) = mpsc::channel(self.delivery_queue_size);
        let worker = DispatchWorker::new(
            format!("{}/{}", key.owner, key.name),
            listener,
            receiver,
        );

        let mut next: BindingMap = (**current).clone();
        next.insert(
            key.clone(),
            Arc::new(SubscriberBinding {
                subscription,
                sender,
                _worker: worker,
            }),
        );
        self.bindings.store(Arc::new(next));

        info!(
            event = events::SUBSCRIPTION_REGISTER_OK,
            component = COMPONENT,
            owner = key.owner.as_str(),
            name = key.name.as_str(),
            "subscription registered"
        );
        Ok(())
    }

    /// Removes a subscription. The dropped binding closes the delivery
    /// queue; the dispatch worker drains what is queued and stops.
    pub async fn unregister(&self, owner: &str, name: &str) -> Result<(), RouterError> {
        let _guard = self.mutation_guard.lock().await;
        let key = SubscriptionKey {
            owner: owner.to_string(),
            name: name.to_string(),
        };

        let current = self.bindings.load();
        if !current.contains_key(&key) {
            warn!(
                event = events::SUBSCRIPTION_UNREGISTER_MISSING,
                component = COMPONENT,
                owner,
                name,
                "subscription not registered"
            );
            return Err(RouterError::NotRegistered {
                owner: key.owner,
                name: key.name,
            });
        }

        let mut next: BindingMap = (**current).clone();
        next.remove(&key);
        self.bindings.store(Arc::new(next));

        info!(
            event = events::SUBSCRIPTION_UNREGISTER_OK,
            component = COMPONENT,
            owner,
            name,
            "subscription unregistered"
        );
        Ok(())
    }

    /// Delivers `message` to every subscriber whose subscription accepts the
    /// publishing publication or the message's own runtime types. Returns
    /// the number of subscribers the message was enqueued for.
    ///
    /// `copy = true` hands each recipient an independently mutable deep
    /// copy; `copy = false` shares one payload reference across recipients.
    /// Delivery order across subscribers is unspecified; per subscriber it
    /// follows publish order.
    pub async fn distribute(
        &self,
        publication: &Publication,
        message: Message,
        copy: bool,
    ) -> usize {
        let bindings = self.bindings.load_full();
        let mut delivered = 0_usize;

        for (key, binding) in bindings.iter() {
            if !subscription_accepts(&binding.subscription, publication, &message) {
                continue;
            }

            let delivery = if copy {
                message.deep_copy()
            } else {
                message.clone()
            };

            match binding.sender.send(delivery).await {
                Ok(()) => {
                    delivered += 1;
                    debug!(
                        event = events::DELIVER_ENQUEUE,
                        component = COMPONENT,
                        owner = key.owner.as_str(),
                        name = key.name.as_str(),
                        msg_id = fields::format_message_id(&message).as_str(),
                        copy,
                        "message enqueued for subscriber"
                    );
                }
                Err(_) => {
                    // Never blocks delivery to the remaining subscribers.
                    warn!(
                        event = events::DELIVER_QUEUE_CLOSED,
                        component = COMPONENT,
                        owner = key.owner.as_str(),
                        name = key.name.as_str(),
                        msg_id = fields::format_message_id(&message).as_str(),
                        "delivery queue closed; skipping subscriber"
                    );
                }
            }
        }

        if delivered == 0 {
            debug!(
                event = events::DISTRIBUTE_NO_MATCH,
                component = COMPONENT,
                publisher = publication.owner(),
                msg_id = fields::format_message_id(&message).as_str(),
                payload_types = fields::format_type_tags(message.type_tags()).as_str(),
                "no subscriber matched"
            );
        }

        delivered
    }

    #[cfg(test)]
    pub(crate) fn registered_count(&self) -> usize {
        self.bindings.load().len()
    }
}

/// A subscription accepts a message when one of its filters matches one of
/// the publication's filters, or when one of its type filters accepts the
/// message's cached runtime types.
fn subscription_accepts(
    subscription: &Subscription,
    publication: &Publication,
    message: &Message,
) -> bool {
    for subscriber_filter in subscription.filters() {
        if publication
            .filters()
            .iter()
            .any(|published| subscriber_filter.matches(published))
        {
            return true;
        }
        if let Filter::Type(type_filter) = subscriber_filter {
            if type_filter.matches_tags(message.type_tags()) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{subscription_accepts, MessageDistributor};
    use crate::filter::{MatchType, NameFilter, TypeFilter};
    use crate::interest::{Publication, Subscription};
    use crate::message::Message;
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

    struct FailingListener;

    #[async_trait]
    impl MessageListener for FailingListener {
        async fn on_message(&self, _message: Message) -> Result<(), RouterError> {
            Err(RouterError::Listener("rejecting everything".to_string()))
        }
    }

    fn string_subscription(owner: &str) -> Subscription {
        Subscription::new(owner, "strings")
            .with_filter(TypeFilter::new(MatchType::Any).with::<String>())
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_unregister_missing() {
        let distributor = MessageDistributor::new(8);
        let listener = RecordingListener::new();

        distributor
            .register(string_subscription("archiver"), listener.clone())
            .await
            .expect("first registration should succeed");
        assert!(matches!(
            distributor
                .register(string_subscription("archiver"), listener.clone())
                .await,
            Err(RouterError::AlreadyRegistered { .. })
        ));

        distributor
            .unregister("archiver", "strings")
            .await
            .expect("unregister should succeed");
        assert!(matches!(
            distributor.unregister("archiver", "strings").await,
            Err(RouterError::NotRegistered { .. })
        ));
        assert_eq!(distributor.registered_count(), 0);
    }

    #[tokio::test]
    async fn copy_false_delivers_reference_equal_payload() {
        let distributor = MessageDistributor::new(8);
        let listener = RecordingListener::new();
        distributor
            .register(string_subscription("viewer"), listener.clone())
            .await
            .expect("registration should succeed");

        let publication = Publication::new("publisher", "out");
        let message = Message::from_payload(Box::new("hello".to_string()));
        let published_payload = message.payloads()[0].clone();

        let delivered = distributor.distribute(&publication, message, false).await;
        assert_eq!(delivered, 1);

        let received = listener.wait_for(1).await;
        assert!(Arc::ptr_eq(&received[0].payloads()[0], &published_payload));
    }

    #[tokio::test]
    async fn copy_true_delivers_independent_payloads() {
        let distributor = MessageDistributor::new(8);
        let listener = RecordingListener::new();
        distributor
            .register(string_subscription("viewer"), listener.clone())
            .await
            .expect("registration should succeed");

        let publication = Publication::new("publisher", "out");
        let message = Message::from_payload(Box::new("hello".to_string()));
        let published_payload = message.payloads()[0].clone();
        let source_id = message.id();

        distributor.distribute(&publication, message, true).await;

        let received = listener.wait_for(1).await;
        assert!(!Arc::ptr_eq(&received[0].payloads()[0], &published_payload));
        assert!(received[0].is_copy());
        assert_eq!(received[0].original_id(), source_id);
    }

    #[tokio::test]
    async fn failing_subscriber_does_not_block_others() {
        let distributor = MessageDistributor::new(8);
        let healthy = RecordingListener::new();

        distributor
            .register(string_subscription("failing"), Arc::new(FailingListener))
            .await
            .expect("failing registration should succeed");
        distributor
            .register(string_subscription("healthy"), healthy.clone())
            .await
            .expect("healthy registration should succeed");

        let publication = Publication::new("publisher", "out");
        let delivered = distributor
            .distribute(
                &publication,
                Message::from_payload(Box::new("hello".to_string())),
                false,
            )
            .await;

        assert_eq!(delivered, 2);
        assert_eq!(healthy.wait_for(1).await.len(), 1);
    }

    #[tokio::test]
    async fn delivery_is_fifo_per_subscriber() {
        let distributor = MessageDistributor::new(8);
        let listener = RecordingListener::new();
        distributor
            .register(string_subscription("ordered"), listener.clone())
            .await
            .expect("registration should succeed");

        let publication = Publication::new("publisher", "out");
        for text in ["first", "second", "third"] {
            distributor
                .distribute(
                    &publication,
                    Message::from_payload(Box::new(text.to_string())),
                    false,
                )
                .await;
        }

        let received = listener.wait_for(3).await;
        let texts: Vec<String> = received
            .iter()
            .map(|message| message.payloads_of::<String>()[0].clone())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn filter_to_filter_interest_matches_through_publication() {
        let subscription = Subscription::new("viewer", "named")
            .with_filter(NameFilter::new(MatchType::Any).with("alerts"));
        let publication = Publication::new("publisher", "out")
            .with_filter(NameFilter::new(MatchType::Any).with("alerts"));
        let unrelated = Message::from_payload(Box::new(1_i64));

        assert!(subscription_accepts(&subscription, &publication, &unrelated));

        let silent_publication = Publication::new("publisher", "out");
        assert!(!subscription_accepts(
            &subscription,
            &silent_publication,
            &unrelated
        ));
    }

    #[test]
    fn type_interest_matches_message_types_without_publication_filters() {
        let subscription = string_subscription("viewer");
        let publication = Publication::new("publisher", "out");
        let message = Message::from_payload(Box::new("hello".to_string()));

        assert!(subscription_accepts(&subscription, &publication, &message));

        let other = Message::from_payload(Box::new(1_i64));
        assert!(!subscription_accepts(&subscription, &publication, &other));
    }
}
