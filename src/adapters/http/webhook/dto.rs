//! Request/response DTOs for the webhook ingress endpoints.

use serde::{Deserialize, Serialize};

use crate::application::IngressOutcome;

/// Minimal view of a provider callback body: only the event id is read.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub id: Option<String>,
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
    pub dead_lettered: bool,
}

impl From<IngressOutcome> for WebhookAck {
    fn from(outcome: IngressOutcome) -> Self {
        Self {
            received: true,
            duplicate: outcome.is_duplicate(),
            dead_lettered: outcome.is_dead_lettered(),
        }
    }
}

/// Liveness body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DlqEntryId;

    #[test]
    fn ack_reflects_outcome() {
        let ack = WebhookAck::from(IngressOutcome::DeadLettered {
            entry_id: DlqEntryId::new(),
        });
        assert!(ack.received);
        assert!(ack.dead_lettered);
        assert!(!ack.duplicate);

        let ack = WebhookAck::from(IngressOutcome::Duplicate);
        assert!(ack.duplicate);
    }

    #[test]
    fn envelope_ignores_other_fields() {
        let envelope: WebhookEnvelope =
            serde_json::from_str(r#"{"id":"evt_1","type":"invoice.paid","data":{}}"#).unwrap();
        assert_eq!(envelope.id.as_deref(), Some("evt_1"));
    }
}
