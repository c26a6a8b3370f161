//! services/api/src/adapters/change_feed.rs
//!
//! Fan-out of store change notifications to any number of subscribers.

use document_viewer_core::domain::ChangeEvent;
use document_viewer_core::ports::ChangeStream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

const CAPACITY: usize = 256;

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }
}

impl ChangeFeed {
    /// Sends an event to current subscribers. Having none is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> ChangeStream {
        let mut receiver = self.sender.subscribe();
        Box::pin(async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => yield event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Change subscriber lagged; {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
