//! Canonical structured event names used across `flowmesh-router`.

// Distribution and dispatch events.
pub const DELIVER_ENQUEUE: &str = "deliver_enqueue";
pub const DELIVER_QUEUE_CLOSED: &str = "deliver_queue_closed";
pub const DISPATCH_ATTEMPT: &str = "dispatch_attempt";
pub const DISPATCH_LISTENER_FAILED: &str = "dispatch_listener_failed";
pub const DISPATCH_QUEUE_CLOSED: &str = "dispatch_queue_closed";
pub const DISTRIBUTE_NO_MATCH: &str = "distribute_no_match";

// Subscription registry events.
pub const SUBSCRIPTION_REGISTER_OK: &str = "subscription_register_ok";
pub const SUBSCRIPTION_REGISTER_DUPLICATE: &str = "subscription_register_duplicate";
pub const SUBSCRIPTION_UNREGISTER_OK: &str = "subscription_unregister_ok";
pub const SUBSCRIPTION_UNREGISTER_MISSING: &str = "subscription_unregister_missing";

// Transformer events.
pub const TRANSFORM_APPLIED: &str = "transform_applied";
pub const TRANSFORM_NONE_REGISTERED: &str = "transform_none_registered";
