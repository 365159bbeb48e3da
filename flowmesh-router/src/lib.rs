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

//! # flowmesh-router
//!
//! `flowmesh-router` implements the filter-matching and message-routing core
//! that composes analytics pipelines out of independently deployed
//! components exchanging typed, filterable messages.
//!
//! Components declare what they emit as a [`Publication`] and what they want
//! delivered as a [`Subscription`]; both are named sets of [`Filter`]
//! predicates. Every publisher is handed a [`PubSubChannel`]; the shared
//! [`MessageDistributor`] matches each outgoing [`Message`] against all
//! registered subscriptions and delivers copies or shared references, and
//! the [`Transformer`] optionally derives and republishes alternate
//! representations of a published object.
//!
//! ## Delivery model
//!
//! Each registered subscriber owns a bounded delivery queue drained by a
//! dedicated dispatch worker thread: delivery is FIFO per subscriber, order
//! across subscribers is unspecified, a full queue blocks the publisher
//! (backpressure), and one failing listener never prevents delivery to any
//! other recipient.
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use flowmesh_router::{
//!     MatchType, Message, MessageDistributor, MessageListener, PubSubChannel, Publication,
//!     RouterError, Subscription, Transformer, TypeFilter,
//! };
//!
//! struct NullListener;
//!
//! #[async_trait]
//! impl MessageListener for NullListener {
//!     async fn on_message(&self, _message: Message) -> Result<(), RouterError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let distributor = Arc::new(MessageDistributor::new(16));
//! let transformer = Arc::new(Transformer::new());
//!
//! let subscription = Subscription::new("viewer", "strings")
//!     .with_filter(TypeFilter::new(MatchType::Any).with::<String>());
//! distributor
//!     .register(subscription, Arc::new(NullListener))
//!     .await
//!     .unwrap();
//!
//! let channel = PubSubChannel::new(
//!     Publication::new("archiver", "out"),
//!     distributor.clone(),
//!     transformer,
//! );
//!
//! let delivered = channel.publish(Box::new("hello".to_string()), false).await;
//! assert_eq!(delivered, 1);
//!
//! // Re-registering the same (owner, name) fails; so does removing twice.
//! assert!(distributor
//!     .register(
//!         Subscription::new("viewer", "strings"),
//!         Arc::new(NullListener)
//!     )
//!     .await
//!     .is_err());
//! distributor.unregister("viewer", "strings").await.unwrap();
//! assert!(distributor.unregister("viewer", "strings").await.is_err());
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Data model: [`Message`], [`Payload`], [`TypeTag`], [`Filter`] variants
//! - Interests: [`Publication`] / [`Subscription`]
//! - Routing: subscription registry, match policy, per-subscriber dispatch
//! - Runtime: dedicated consume-loop threads
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber;
//! binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

use async_trait::async_trait;

mod channel;
pub use channel::PubSubChannel;

mod error;
pub use error::RouterError;

mod filter;
pub use filter::{Filter, MatchType, NameFilter, RequestFilter, SourceFilter, TypeFilter};

mod interest;
pub use interest::{Publication, Subscription};

mod message;
pub use message::{Message, Payload, TypeKey, TypeTag, HEADER_SOURCE_COMPONENT};

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::MessageDistributor;

#[doc(hidden)]
pub mod runtime;

mod transformer;
pub use transformer::Transformer;

/// Receiver side of a subscription: invoked by the subscriber's dispatch
/// worker for every delivered message, in publish order.
///
/// A returned error is logged by the dispatch loop and never affects other
/// recipients or later deliveries to this one.
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_message(&self, message: Message) -> Result<(), RouterError>;
}
