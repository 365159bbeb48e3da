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

//! Per-subscriber dispatch worker: drains one delivery queue on a dedicated
//! thread so a slow or failing listener never affects other recipients.

use crate::message::Message;
use crate::observability::{
    events,
    fields::{self, WorkerContext},
};
use crate::runtime::worker_runtime::{build_thread_name, spawn_consume_loop};
use crate::MessageListener;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DISPATCH_THREAD_NAME_PREFIX: &str = "fm-disp-";
const DISPATCH_THREAD_NAME_MAX_LEN: usize = 15;
const COMPONENT: &str = "dispatch_worker";

/// Worker state owning the spawned dispatch-loop thread handle.
pub(crate) struct DispatchWorker {
    worker_id: String,
    _loop_handle: JoinHandle<()>,
}

impl DispatchWorker {
    /// Spawns a dedicated thread draining one subscriber's delivery queue.
    pub(crate) fn new(
        subscriber: String,
        listener: Arc<dyn MessageListener>,
        receiver: Receiver<Message>,
    ) -> Self {
        let worker_id = Uuid::new_v4().simple().to_string();
        let thread_name = build_thread_name(
            DISPATCH_THREAD_NAME_PREFIX,
            &worker_id,
            DISPATCH_THREAD_NAME_MAX_LEN,
        );

        let loop_handle = spawn_consume_loop(thread_name, move || async move {
            Self::dispatch_loop(subscriber, listener, receiver).await;
        });

        Self {
            worker_id,
            _loop_handle: loop_handle,
        }
    }

    #[cfg(test)]
    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Forwards each queued message to the listener. A failing listener is
    /// logged and the loop continues; a closed queue ends the loop.
    pub(crate) async fn dispatch_loop(
        subscriber: String,
        listener: Arc<dyn MessageListener>,
        mut receiver: Receiver<Message>,
    ) {
        let worker_context = WorkerContext::with_current_thread(subscriber);

        while let Some(message) = receiver.recv().await {
            debug!(
                event = events::DISPATCH_ATTEMPT,
                component = COMPONENT,
                subscriber = worker_context.subscriber.as_str(),
                worker_thread = worker_context.worker_thread.as_str(),
                msg_id = fields::format_message_id(&message).as_str(),
                payload_types = fields::format_type_tags(message.type_tags()).as_str(),
                "dispatching message"
            );

            if let Err(err) = listener.on_message(message).await {
                warn!(
                    event = events::DISPATCH_LISTENER_FAILED,
                    component = COMPONENT,
                    subscriber = worker_context.subscriber.as_str(),
                    worker_thread = worker_context.worker_thread.as_str(),
                    err = %err,
                    "listener failed; continuing with next message"
                );
            }
        }

        info!(
            event = events::DISPATCH_QUEUE_CLOSED,
            component = COMPONENT,
            subscriber = worker_context.subscriber.as_str(),
            worker_thread = worker_context.worker_thread.as_str(),
            reason = fields::REASON_DELIVERY_QUEUE_CLOSED,
            "delivery queue closed; stopping dispatch loop"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::DispatchWorker;
    use crate::message::Message;
    use crate::{MessageListener, RouterError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingListener {
        received: AtomicUsize,
    }

    #[async_trait]
    impl MessageListener for CountingListener {
        async fn on_message(&self, _message: Message) -> Result<(), RouterError> {
            self.received.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct FailingListener;

    #[async_trait]
    impl MessageListener for FailingListener {
        async fn on_message(&self, _message: Message) -> Result<(), RouterError> {
            Err(RouterError::Listener("always fails".to_string()))
        }
    }

    #[tokio::test]
    async fn dispatch_loop_exits_on_closed_queue() {
        let listener = Arc::new(CountingListener::default());
        let (sender, receiver) = mpsc::channel(8);
        drop(sender);

        DispatchWorker::dispatch_loop("closed".to_string(), listener.clone(), receiver).await;

        assert_eq!(listener.received.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn dispatch_loop_drains_pending_messages_before_exit() {
        let listener = Arc::new(CountingListener::default());
        let (sender, receiver) = mpsc::channel(8);

        sender
            .send(Message::from_payload(Box::new("a".to_string())))
            .await
            .expect("queue should accept message");
        sender
            .send(Message::from_payload(Box::new("b".to_string())))
            .await
            .expect("queue should accept message");
        drop(sender);

        DispatchWorker::dispatch_loop("draining".to_string(), listener.clone(), receiver).await;

        assert_eq!(listener.received.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn dispatch_loop_survives_listener_failures() {
        let (sender, receiver) = mpsc::channel(8);

        sender
            .send(Message::from_payload(Box::new("boom".to_string())))
            .await
            .expect("queue should accept message");
        drop(sender);

        // Must return rather than abort on the listener error.
        DispatchWorker::dispatch_loop("failing".to_string(), Arc::new(FailingListener), receiver)
            .await;
    }

    #[tokio::test]
    async fn worker_id_is_populated() {
        let (_sender, receiver) = mpsc::channel(1);
        let worker = DispatchWorker::new(
            "id-check".to_string(),
            Arc::new(CountingListener::default()),
            receiver,
        );
        assert!(!worker.worker_id().is_empty());
    }
}
