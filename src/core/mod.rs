//! Core data structures and types for the Logvault event store

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single log record.
///
/// Events never change after construction. The store shares one allocation
/// between its indexes, so identity is the `Arc` pointer rather than field
/// equality: two events with identical fields are stored as distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    timestamp: i64, // milliseconds since epoch
    service_name: String,
    host_id: String,
    message: String,
}

impl LogEvent {
    pub fn new(
        timestamp: i64,
        service_name: impl Into<String>,
        host_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            service_name: service_name.into(),
            host_id: host_id.into(),
            message: message.into(),
        }
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Opaque payload.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for LogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogEvent{{timestamp={}, service={}, host={}, message={}}}",
            self.timestamp, self.service_name, self.host_id, self.message
        )
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_camel_case_fields() {
        let event = LogEvent::new(1_700_000_000_000, "PaymentService", "payment-node-1", "ok");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["serviceName"], "PaymentService");
        assert_eq!(json["hostId"], "payment-node-1");
        assert_eq!(json["message"], "ok");
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
