use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::events::DomainEvent;
use crate::domain::ports::EventPublisher;

/// Publishes events as JSON to NATS.
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub async fn connect(url: &str) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        info!(%url, "connected to NATS");
        Ok(Self { client })
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(%subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = self.client.publish(subject.clone(), payload.into()).await {
            error!(%subject, error = %e, "failed to publish event");
        }
    }
}

/// Used when no broker is configured: events only reach the trace log.
#[derive(Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: DomainEvent) {
        info!(subject = %event.subject(), ?event, "domain event");
    }
}
