//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external services: cache, message
//! broker, SMTP, realtime delivery and the metrics recorder.

pub mod cache;
pub mod events;
pub mod mailer;
pub mod metrics;
pub mod queue;
pub mod realtime;
