//! Prometheus metrics for the server.
//!
//! Counters and gauges are updated in-process and rendered through the
//! pull-based `/metrics` endpoint in text exposition format.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names as constants for consistency.
pub mod names {
    pub const APP_EVENTS_TOTAL: &str = "app_events_total";
    pub const USER_REGISTRATIONS_TOTAL: &str = "user_registrations_total";
    pub const USER_LOGINS_TOTAL: &str = "user_logins_total";
    pub const FILE_UPLOADS_TOTAL: &str = "file_uploads_total";
    pub const REDIS_OPERATIONS_TOTAL: &str = "redis_operations_total";
    pub const RABBITMQ_MESSAGES_TOTAL: &str = "rabbitmq_messages_total";
    pub const EMAIL_SENT_TOTAL: &str = "email_sent_total";
    pub const SOCKET_CONNECTIONS: &str = "socket_connections";
    pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
}

/// Initialize the Prometheus metrics exporter.
///
/// This should be called once at server startup.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("Prometheus metrics already initialized");
        return false;
    }

    // install_recorder() for pull-based metrics (we serve /metrics ourselves)
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Failed to store Prometheus handle (already set)");
                return false;
            }

            tracing::info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render all metrics in Prometheus text format.
///
/// Returns `None` if metrics were not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

/// Record a fan-out event, tagged by event type and outcome.
pub fn record_event(event_type: &str, outcome: &str) {
    counter!(
        names::APP_EVENTS_TOTAL,
        "type" => event_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_user_registration() {
    counter!(names::USER_REGISTRATIONS_TOTAL).increment(1);
}

pub fn record_user_login(status: &str) {
    counter!(names::USER_LOGINS_TOTAL, "status" => status.to_string()).increment(1);
}

pub fn record_file_upload(mime_type: &str) {
    counter!(names::FILE_UPLOADS_TOTAL, "file_type" => mime_type.to_string()).increment(1);
}

pub fn record_redis_operation(operation: &str, status: &str) {
    counter!(
        names::REDIS_OPERATIONS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_queue_message(queue: &str, action: &str) {
    counter!(
        names::RABBITMQ_MESSAGES_TOTAL,
        "queue" => queue.to_string(),
        "action" => action.to_string()
    )
    .increment(1);
}

pub fn record_email(template: &str, status: &str) {
    counter!(
        names::EMAIL_SENT_TOTAL,
        "template" => template.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn increment_socket_connections() {
    gauge!(names::SOCKET_CONNECTIONS).increment(1.0);
}

pub fn decrement_socket_connections() {
    gauge!(names::SOCKET_CONNECTIONS).decrement(1.0);
}

pub fn record_cache_hit() {
    counter!(names::CACHE_HITS_TOTAL).increment(1);
}

pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}
