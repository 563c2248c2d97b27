//! Event envelope for the analytics collector
//!
//! Every tracked occurrence becomes one `Event`: the caller's payload
//! merged with common fields (session, timestamp, page URL, referrer)
//! plus a device-info block derived from the client environment.
//!
//! Events are immutable once built; ownership moves to the queue on
//! enqueue and to the network path on drain.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::environment::{Browser, ClientEnvironment, DeviceClass, Os};

/// Device metadata attached to every event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Screen resolution, e.g. "1920x1080"
    pub screen_resolution: String,
    /// Browser family
    pub browser: Browser,
    /// Operating system family
    pub os: Os,
    /// Device class
    pub device_type: DeviceClass,
}

/// One structured record destined for the collector
///
/// `session_id` and `page_url` are duplicated at the top level for
/// collector convenience; `event_data` carries them too, alongside the
/// type-specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type tag (page_view, user_login, ...)
    pub event_type: String,

    /// Type-specific payload merged with the common fields
    pub event_data: Value,

    /// Session this event belongs to
    pub session_id: String,

    /// Page URL at the time the event was observed
    pub page_url: String,

    /// Device metadata derived from the user-agent
    pub device_info: DeviceInfo,

    /// Content-based hash so the collector can deduplicate the
    /// double-sent priority events (32-char hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_hash: Option<String>,
}

impl Event {
    /// Build an enriched event from a caller payload.
    ///
    /// Common fields overwrite same-named keys in `data`; a non-object
    /// payload is wrapped under a `"value"` key rather than rejected.
    pub fn build(event_type: &str, data: Value, session_id: &str, env: &ClientEnvironment) -> Self {
        let timestamp = Utc::now().to_rfc3339();

        let mut fields = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        fields.insert(
            "session_id".to_string(),
            Value::String(session_id.to_string()),
        );
        fields.insert("timestamp".to_string(), Value::String(timestamp.clone()));
        fields.insert(
            "page_url".to_string(),
            Value::String(env.page_url.clone()),
        );
        fields.insert(
            "referrer".to_string(),
            Value::String(env.referrer.clone()),
        );

        let event_data = Value::Object(fields);
        let event_hash = compute_event_hash(event_type, &timestamp, &event_data);

        Event {
            event_type: event_type.to_string(),
            event_data,
            session_id: session_id.to_string(),
            page_url: env.page_url.clone(),
            device_info: env.device_info(),
            event_hash: Some(event_hash),
        }
    }
}

/// Compute a content-based hash for event deduplication
///
/// Returns a 32-character hex digest of SHA-256(event_type + timestamp + data)
fn compute_event_hash(event_type: &str, timestamp: &str, data: &Value) -> String {
    let content = serde_json::to_string(data).unwrap_or_default();
    let hash_input = format!("{}:{}:{}", event_type, timestamp, content);

    let mut hasher = Sha256::new();
    hasher.update(hash_input.as_bytes());
    let result = hasher.finalize();

    // Take first 16 bytes (32 hex chars)
    hex::encode(&result[..16])
}
