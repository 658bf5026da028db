use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use settings_sync_sdk::Category;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Audit record emitted after every confirmed settings change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub user_id: Uuid,
    pub category: Category,
    pub data: Value,
    pub previous_data: Value,
    pub timestamp: DateTime<Utc>,
}

/// Output port for domain events. Publishing is fire-and-forget.
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}

/// Writes change events to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventPublisher;

impl EventPublisher<ChangeEvent> for LogEventPublisher {
    fn publish(&self, event: &ChangeEvent) {
        tracing::info!(
            user_id = %event.user_id,
            category = %event.category,
            timestamp = %event.timestamp,
            data = %event.data,
            previous_data = %event.previous_data,
            "Settings changed"
        );
    }
}

/// Fans change events out to in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastEventPublisher {
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher<ChangeEvent> for BroadcastEventPublisher {
    fn publish(&self, event: &ChangeEvent) {
        // no subscribers is fine
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(category = %event.category, "No change event subscribers");
        }
    }
}
