// # Event Source Trait
//
// Defines how external triggers reach the engine.
//
// Payloads are decoded into the closed [`Event`] type at the delivery
// boundary. Handlers never inspect raw arguments; a payload that does not
// decode is logged and dropped by the source.

use crate::record::Resource;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// An external trigger for the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Event {
    /// A single resource was created or modified in the registry
    ResourceChanged(Resource),
    /// Time for a full reconciliation pass
    #[serde(alias = "timer")]
    PeriodicTick,
    /// The registry asks this provider to shut down
    Terminate,
}

impl Event {
    /// Decode a wire message, e.g.
    /// `{"type": "resource_changed", "payload": {"id": .., "type": "dns", "value": {..}}}`
    pub fn decode(message: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(message)
            .map_err(|e| crate::Error::invalid_input(format!("Malformed event payload: {}", e)))
    }
}

/// Trait for event source implementations
///
/// # Trust Level: Semi-Trusted
///
/// Sources may spawn a task to feed the stream. They MUST NOT call the
/// provider or act on events themselves; they only observe and forward.
pub trait EventSource: Send + Sync {
    /// Stream of events. The stream should run until the source is
    /// dropped; dropping the stream must release the source's resources.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = Event> + Send + 'static>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_resource_changed() {
        let message = r#"{
            "type": "resource_changed",
            "payload": {"id": "r1", "type": "dns", "value": {"host": "www", "type": "A", "ttl": 300, "value": "1.1.1.1"}}
        }"#;

        match Event::decode(message).unwrap() {
            Event::ResourceChanged(resource) => {
                assert_eq!(resource.id, "r1");
                assert_eq!(resource.as_dns().unwrap().host, "www");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_unit_events() {
        assert_eq!(Event::decode(r#"{"type": "timer"}"#).unwrap(), Event::PeriodicTick);
        assert_eq!(Event::decode(r#"{"type": "periodic_tick"}"#).unwrap(), Event::PeriodicTick);
        assert_eq!(Event::decode(r#"{"type": "terminate"}"#).unwrap(), Event::Terminate);
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        assert!(Event::decode("not json").is_err());
        assert!(Event::decode(r#"{"type": "resource_changed"}"#).is_err());
        assert!(Event::decode(r#"{"type": "resource_changed", "payload": [1, 2]}"#).is_err());
        assert!(Event::decode(r#"{"type": "reboot"}"#).is_err());
    }
}
