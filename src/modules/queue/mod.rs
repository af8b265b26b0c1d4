//! Best-effort AMQP publisher for notification events.
//!
//! A background task owns the broker connection and keeps a single durable
//! queue declared. Publishes are fire-and-forget: while the channel is down
//! messages are dropped, not buffered, and the caller never sees an error
//! surface in the HTTP response. Only the connection itself is retried, on a
//! fixed interval with no backoff growth and no retry cap.

use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::core::config::AmqpConfig;
use crate::modules::events::NotificationEvent;
use crate::modules::metrics;

pub struct QueuePublisher {
    url: String,
    queue: String,
    reconnect_delay: Duration,
    channel: RwLock<Option<Channel>>,
}

impl QueuePublisher {
    pub fn new(config: &AmqpConfig) -> Self {
        Self {
            url: config.url.clone(),
            queue: config.queue.clone(),
            reconnect_delay: config.reconnect_delay,
            channel: RwLock::new(None),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    /// Connection supervisor. Runs until the process exits: connect, declare
    /// the durable queue, expose the channel, then watch for disconnects and
    /// retry after the fixed delay.
    pub async fn run(self: Arc<Self>) {
        loop {
            match self.connect_and_declare().await {
                Ok((connection, channel)) => {
                    tracing::info!(queue = %self.queue, "AMQP channel open");
                    *self.channel.write().await = Some(channel.clone());

                    // Watch the connection; any error drops us back to disconnected
                    while connection.status().connected() && channel.status().connected() {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }

                    *self.channel.write().await = None;
                    tracing::warn!(
                        "AMQP connection lost, reconnecting in {}s",
                        self.reconnect_delay.as_secs()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "AMQP connect failed: {}, retrying in {}s",
                        e,
                        self.reconnect_delay.as_secs()
                    );
                }
            }

            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn connect_and_declare(&self) -> Result<(Connection, Channel), lapin::Error> {
        let connection =
            Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        // Idempotent: redeclaring the same durable queue is a no-op
        channel
            .queue_declare(
                &self.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        Ok((connection, channel))
    }

    /// Publish an event as a persistent JSON message. Skips entirely when
    /// the channel is closed; never blocks the HTTP response on delivery.
    pub async fn publish(&self, event: &NotificationEvent) -> Result<(), lapin::Error> {
        let guard = self.channel.read().await;
        let Some(channel) = guard.as_ref() else {
            tracing::debug!(
                event_type = event.kind.as_str(),
                "Queue channel closed, message dropped"
            );
            metrics::record_queue_message(&self.queue, "skipped");
            return Ok(());
        };

        let body = match serde_json::to_vec(&event.to_queue_json()) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Unserializable queue frame dropped");
                return Ok(());
            }
        };

        // Fire-and-forget: the publisher confirm is not awaited
        let result = channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await;

        match result {
            Ok(_confirm) => {
                metrics::record_queue_message(&self.queue, "published");
                Ok(())
            }
            Err(e) => {
                metrics::record_queue_message(&self.queue, "error");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::events::EventKind;

    #[tokio::test]
    async fn publish_with_closed_channel_is_a_silent_skip() {
        let publisher = QueuePublisher::new(&AmqpConfig {
            url: "amqp://127.0.0.1:5672/%2f".to_string(),
            queue: "app_messages".to_string(),
            reconnect_delay: Duration::from_secs(5),
        });

        let event =
            NotificationEvent::new(EventKind::ItemCreated, serde_json::json!({ "id": 1 }));

        // No run() task was spawned, so the channel is closed; the publish
        // must succeed without blocking or erroring.
        assert!(publisher.publish(&event).await.is_ok());
    }
}
