//! Field formatting helpers shared by distribution and dispatch logging.

use crate::message::{Message, TypeTag};

pub const REASON_DELIVERY_QUEUE_CLOSED: &str = "delivery_queue_closed";

/// Correlation context for one dispatch worker loop.
pub struct WorkerContext {
    pub subscriber: String,
    pub worker_thread: String,
}

impl WorkerContext {
    pub fn with_current_thread(subscriber: String) -> Self {
        let worker_thread = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        Self {
            subscriber,
            worker_thread,
        }
    }
}

pub fn format_message_id(message: &Message) -> String {
    message.id().to_string()
}

pub fn format_type_tags(tags: &[TypeTag]) -> String {
    tags.iter()
        .map(|tag| tag.key().name())
        .collect::<Vec<_>>()
        .join(",")
}
