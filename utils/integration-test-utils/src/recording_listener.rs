//! Message-capturing listener for routing assertions.

use async_trait::async_trait;
use flowmesh_router::{Message, MessageListener, RouterError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Records every delivered message; tests poll [`RecordingListener::wait_for`]
/// until the expected count arrives.
pub struct RecordingListener {
    received: Mutex<Vec<Message>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            received: Mutex::new(Vec::new()),
        })
    }

    pub async fn received(&self) -> Vec<Message> {
        self.received.lock().await.clone()
    }

    /// Waits until at least `count` messages arrived, panicking after a
    /// generous timeout so a routing regression fails fast instead of
    /// hanging the suite.
    pub async fn wait_for(&self, count: usize) -> Vec<Message> {
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
