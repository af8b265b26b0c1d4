//! Notification events emitted after successful mutations.
//!
//! Events are ephemeral: they are pushed to open realtime connections and
//! published to the broker queue, but never persisted. A missed delivery is
//! accepted data loss.

pub mod dispatcher;

pub use dispatcher::EventDispatcher;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::shared::constants::{CACHE_KIND_FILES, CACHE_KIND_ITEMS};

/// Every mutation type that triggers a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    FileUploaded,
    FileUpdated,
}

impl EventKind {
    /// Wire name, e.g. `item_created`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ItemCreated => "item_created",
            EventKind::ItemUpdated => "item_updated",
            EventKind::ItemDeleted => "item_deleted",
            EventKind::FileUploaded => "file_uploaded",
            EventKind::FileUpdated => "file_updated",
        }
    }

    /// Cache resource kind invalidated by this event.
    pub fn resource_kind(&self) -> &'static str {
        match self {
            EventKind::ItemCreated | EventKind::ItemUpdated | EventKind::ItemDeleted => {
                CACHE_KIND_ITEMS
            }
            EventKind::FileUploaded | EventKind::FileUpdated => CACHE_KIND_FILES,
        }
    }

    /// Whether this event also notifies the owner by e-mail.
    pub fn sends_email(&self) -> bool {
        matches!(self, EventKind::FileUploaded)
    }
}

/// A mutation outcome fanned out to cache, realtime, queue, mail and metrics.
/// The payload is the mutated record, or just `{id}` for deletions.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl NotificationEvent {
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }

    /// JSON frame delivered to realtime connections.
    pub fn to_socket_json(&self) -> serde_json::Value {
        json!({
            "type": self.kind.as_str(),
            "payload": self.payload,
        })
    }

    /// JSON body published to the broker queue.
    pub fn to_queue_json(&self) -> serde_json::Value {
        json!({
            "type": self.kind.as_str(),
            "data": self.payload,
        })
    }
}

/// Contact details for the optional e-mail step of the fan-out.
#[derive(Debug, Clone)]
pub struct EmailRecipient {
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::ItemCreated.as_str(), "item_created");
        assert_eq!(EventKind::ItemDeleted.as_str(), "item_deleted");
        assert_eq!(EventKind::FileUploaded.as_str(), "file_uploaded");
        assert_eq!(EventKind::FileUpdated.as_str(), "file_updated");
    }

    #[test]
    fn test_resource_kind_mapping() {
        assert_eq!(EventKind::ItemUpdated.resource_kind(), "items");
        assert_eq!(EventKind::FileUploaded.resource_kind(), "files");
    }

    #[test]
    fn test_only_file_upload_sends_email() {
        assert!(EventKind::FileUploaded.sends_email());
        assert!(!EventKind::ItemCreated.sends_email());
        assert!(!EventKind::FileUpdated.sends_email());
    }

    #[test]
    fn test_wire_frames() {
        let event = NotificationEvent::new(
            EventKind::ItemDeleted,
            serde_json::json!({ "id": 3 }),
        );

        let socket = event.to_socket_json();
        assert_eq!(socket["type"], "item_deleted");
        assert_eq!(socket["payload"]["id"], 3);

        let queue = event.to_queue_json();
        assert_eq!(queue["type"], "item_deleted");
        assert_eq!(queue["data"]["id"], 3);
    }
}
