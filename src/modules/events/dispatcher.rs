//! Post-mutation fan-out.
//!
//! Invoked once per successful mutation, after the store write has been
//! acknowledged and before the HTTP response is returned. The steps are
//! independent futures with no transactional linkage: each one may fail on
//! its own, the failure is logged, and the response already determined by
//! the store write is never altered.

use std::sync::Arc;

use crate::modules::cache::{self, CacheClient};
use crate::modules::events::{EmailRecipient, NotificationEvent};
use crate::modules::mailer::Mailer;
use crate::modules::metrics;
use crate::modules::queue::QueuePublisher;
use crate::modules::realtime::RealtimeHub;

pub struct EventDispatcher {
    cache: CacheClient,
    hub: Arc<RealtimeHub>,
    queue: Arc<QueuePublisher>,
    mailer: Arc<Mailer>,
}

impl EventDispatcher {
    pub fn new(
        cache: CacheClient,
        hub: Arc<RealtimeHub>,
        queue: Arc<QueuePublisher>,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            cache,
            hub,
            queue,
            mailer,
        }
    }

    /// Run the fan-out for one mutation. Steps execute concurrently with no
    /// ordering guarantee between them; this function itself never fails.
    pub async fn dispatch(
        &self,
        owner_id: i32,
        recipient: &EmailRecipient,
        event: NotificationEvent,
    ) {
        let cache_key = cache::owner_key(event.kind.resource_kind(), owner_id);

        let cache_step = async {
            self.cache
                .delete(&cache_key)
                .await
                .map_err(|e| e.to_string())
        };

        let realtime_step = async {
            self.hub.broadcast(owner_id, event.clone()).await;
            Ok::<(), String>(())
        };

        let queue_step = async { self.queue.publish(&event).await.map_err(|e| e.to_string()) };

        let email_step = async {
            if !event.kind.sends_email() {
                return Ok(());
            }
            let file_name = event
                .payload
                .get("original_name")
                .and_then(|v| v.as_str())
                .unwrap_or("your file");
            self.mailer
                .send_file_uploaded(&recipient.email, &recipient.name, file_name)
                .await
                .map_err(|e| e.to_string())
        };

        let (cache_res, realtime_res, queue_res, email_res) =
            tokio::join!(cache_step, realtime_step, queue_step, email_step);

        let mut all_ok = true;
        let steps = [
            ("cache_invalidate", cache_res),
            ("realtime_notify", realtime_res),
            ("queue_publish", queue_res),
            ("email_notify", email_res),
        ];
        for (step, result) in steps {
            if let Err(e) = result {
                all_ok = false;
                tracing::warn!(
                    step,
                    event_type = event.kind.as_str(),
                    owner_id,
                    error = %e,
                    "Fan-out step failed"
                );
            }
        }

        metrics::record_event(
            event.kind.as_str(),
            if all_ok { "success" } else { "partial" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AmqpConfig;
    use crate::core::config::SmtpConfig;
    use crate::modules::events::EventKind;
    use std::time::Duration;

    fn dispatcher() -> EventDispatcher {
        let mailer = Mailer::new(&SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@example.com".to_string(),
        })
        .unwrap();

        EventDispatcher::new(
            CacheClient::disabled(),
            Arc::new(RealtimeHub::new()),
            Arc::new(QueuePublisher::new(&AmqpConfig {
                url: "amqp://127.0.0.1:5672/%2f".to_string(),
                queue: "app_messages".to_string(),
                reconnect_delay: Duration::from_secs(5),
            })),
            Arc::new(mailer),
        )
    }

    #[tokio::test]
    async fn dispatch_never_fails_with_all_backends_down() {
        let dispatcher = dispatcher();
        let recipient = EmailRecipient {
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
        };

        // Cache disabled, no realtime connections, queue channel closed and
        // no email step for item events: every step must complete silently.
        dispatcher
            .dispatch(
                7,
                &recipient,
                NotificationEvent::new(EventKind::ItemCreated, serde_json::json!({ "id": 1 })),
            )
            .await;

        dispatcher
            .dispatch(
                7,
                &recipient,
                NotificationEvent::new(EventKind::ItemDeleted, serde_json::json!({ "id": 1 })),
            )
            .await;
    }
}
