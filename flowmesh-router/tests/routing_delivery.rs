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

use async_trait::async_trait;
use flowmesh_router::{
    MatchType, Message, MessageDistributor, MessageListener, Payload, PubSubChannel, Publication,
    RouterError, Subscription, Transformer, TypeFilter,
};
use integration_test_utils::{init_logging, Measurement, RecordingListener};
use std::sync::Arc;

struct FailingListener;

#[async_trait]
impl MessageListener for FailingListener {
    async fn on_message(&self, _message: Message) -> Result<(), RouterError> {
        Err(RouterError::Listener("listener under test".to_string()))
    }
}

fn measurement_subscription(owner: &str) -> Subscription {
    Subscription::new(owner, "measurements")
        .with_filter(TypeFilter::new(MatchType::Any).with::<Measurement>())
}

fn channel(distributor: Arc<MessageDistributor>, transformer: Arc<Transformer>) -> PubSubChannel {
    PubSubChannel::new(Publication::new("archiver", "out"), distributor, transformer)
}

#[tokio::test(flavor = "multi_thread")]
async fn copy_false_shares_one_reference_across_subscribers() {
    init_logging();

    let distributor = Arc::new(MessageDistributor::new(16));
    let viewer_a = RecordingListener::new();
    let viewer_b = RecordingListener::new();
    distributor
        .register(measurement_subscription("viewer-a"), viewer_a.clone())
        .await
        .expect("viewer-a registration should succeed");
    distributor
        .register(measurement_subscription("viewer-b"), viewer_b.clone())
        .await
        .expect("viewer-b registration should succeed");

    let channel = channel(distributor, Arc::new(Transformer::new()));
    let delivered = channel
        .publish(Box::new(Measurement::new(1, "ambient", 20.5)), false)
        .await;
    assert_eq!(delivered, 2);

    let received_a = viewer_a.wait_for(1).await;
    let received_b = viewer_b.wait_for(1).await;
    assert!(Arc::ptr_eq(
        &received_a[0].payloads()[0],
        &received_b[0].payloads()[0]
    ));
    assert_eq!(received_a[0].id(), received_b[0].id());
}

#[tokio::test(flavor = "multi_thread")]
async fn copy_true_gives_each_subscriber_an_independent_copy() {
    init_logging();

    let distributor = Arc::new(MessageDistributor::new(16));
    let viewer_a = RecordingListener::new();
    let viewer_b = RecordingListener::new();
    distributor
        .register(measurement_subscription("viewer-a"), viewer_a.clone())
        .await
        .expect("viewer-a registration should succeed");
    distributor
        .register(measurement_subscription("viewer-b"), viewer_b.clone())
        .await
        .expect("viewer-b registration should succeed");

    let channel = channel(distributor, Arc::new(Transformer::new()));
    channel
        .publish(Box::new(Measurement::new(1, "ambient", 20.5)), true)
        .await;

    let received_a = viewer_a.wait_for(1).await;
    let received_b = viewer_b.wait_for(1).await;

    assert!(!Arc::ptr_eq(
        &received_a[0].payloads()[0],
        &received_b[0].payloads()[0]
    ));
    assert!(received_a[0].is_copy());
    assert!(received_b[0].is_copy());
    assert_ne!(received_a[0].id(), received_b[0].id());
    assert_eq!(received_a[0].original_id(), received_b[0].original_id());
    assert_eq!(
        received_a[0].payloads_of::<Measurement>(),
        received_b[0].payloads_of::<Measurement>()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn publish_all_delivers_one_message_not_three() {
    init_logging();

    let distributor = Arc::new(MessageDistributor::new(16));
    let viewer = RecordingListener::new();
    distributor
        .register(measurement_subscription("viewer"), viewer.clone())
        .await
        .expect("registration should succeed");

    let channel = channel(distributor, Arc::new(Transformer::new()));
    let payloads: Vec<Box<dyn Payload>> = vec![
        Box::new(Measurement::new(1, "a", 1.0)),
        Box::new(Measurement::new(2, "b", 2.0)),
        Box::new(Measurement::new(3, "c", 3.0)),
    ];
    let delivered = channel.publish_all(payloads, true).await;
    assert_eq!(delivered, 1);

    let received = viewer.wait_for(1).await;
    assert_eq!(received.len(), 1);
    let values = received[0].payloads_of::<Measurement>();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].id, 1);
    assert_eq!(values[2].id, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_subscriber_never_blocks_the_healthy_one() {
    init_logging();

    let distributor = Arc::new(MessageDistributor::new(16));
    let healthy = RecordingListener::new();
    distributor
        .register(measurement_subscription("failing"), Arc::new(FailingListener))
        .await
        .expect("failing registration should succeed");
    distributor
        .register(measurement_subscription("healthy"), healthy.clone())
        .await
        .expect("healthy registration should succeed");

    let channel = channel(distributor, Arc::new(Transformer::new()));
    for id in 0..5 {
        channel
            .publish(Box::new(Measurement::new(id, "burst", id as f64)), false)
            .await;
    }

    let received = healthy.wait_for(5).await;
    let ids: Vec<u64> = received
        .iter()
        .map(|message| message.payloads_of::<Measurement>()[0].id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unmatched_subscriptions_receive_nothing() {
    init_logging();

    let distributor = Arc::new(MessageDistributor::new(16));
    let strings_only = RecordingListener::new();
    let measurements = RecordingListener::new();
    distributor
        .register(
            Subscription::new("strings-only", "strings")
                .with_filter(TypeFilter::new(MatchType::Any).with::<String>()),
            strings_only.clone(),
        )
        .await
        .expect("strings registration should succeed");
    distributor
        .register(measurement_subscription("viewer"), measurements.clone())
        .await
        .expect("measurement registration should succeed");

    let channel = channel(distributor, Arc::new(Transformer::new()));
    let delivered = channel
        .publish(Box::new(Measurement::new(1, "ambient", 20.5)), false)
        .await;

    assert_eq!(delivered, 1);
    measurements.wait_for(1).await;
    assert!(strings_only.received().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn transform_publish_routes_original_and_derived_types() {
    init_logging();

    let distributor = Arc::new(MessageDistributor::new(16));
    let transformer = Arc::new(Transformer::new());
    transformer.register::<Measurement, _>(|measurement| {
        Box::new(format!("{}={}", measurement.label, measurement.value))
    });

    let measurements = RecordingListener::new();
    let strings = RecordingListener::new();
    distributor
        .register(measurement_subscription("viewer"), measurements.clone())
        .await
        .expect("measurement registration should succeed");
    distributor
        .register(
            Subscription::new("projections", "strings")
                .with_filter(TypeFilter::new(MatchType::Any).with::<String>()),
            strings.clone(),
        )
        .await
        .expect("string registration should succeed");

    let channel = channel(distributor, transformer);
    let delivered = channel
        .transform_publish(Box::new(Measurement::new(1, "ambient", 20.5)), true, true)
        .await;
    assert_eq!(delivered, 2);

    let original = measurements.wait_for(1).await;
    assert_eq!(original[0].payloads_of::<Measurement>()[0].id, 1);

    let derived = strings.wait_for(1).await;
    assert_eq!(derived[0].payloads_of::<String>(), vec!["ambient=20.5"]);
}
