use std::sync::Arc;

use crate::config::Config;
use crate::domain::events::DomainEvent;
use crate::domain::ports::{EventPublisher, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub events: Arc<dyn EventPublisher>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, events: Arc<dyn EventPublisher>, config: Config) -> Self {
        Self { store, events, config: Arc::new(config) }
    }

    pub async fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.events.publish(event).await;
        }
    }
}
