//! Inbound webhook delivery record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Provider;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Processing status of a recorded webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Recorded, business handler not finished yet.
    Received,
    /// Business handler completed successfully.
    Processed,
    /// Business handler failed; the payload was handed to the DLQ.
    Failed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Received => "RECEIVED",
            EventStatus::Processed => "PROCESSED",
            EventStatus::Failed => "FAILED",
        }
    }

    /// Parses the stored representation.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "RECEIVED" => Ok(EventStatus::Received),
            "PROCESSED" => Ok(EventStatus::Processed),
            "FAILED" => Ok(EventStatus::Failed),
            other => Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid webhook event status: {}", other),
            )),
        }
    }

    /// Only a freshly received event may be finalized, and only once.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Received, EventStatus::Processed)
                | (EventStatus::Received, EventStatus::Failed)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A webhook delivery, unique per `(provider, event_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub provider: Provider,
    pub event_id: String,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Creates a freshly received event.
    pub fn received(
        provider: Provider,
        event_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let event_id = validate_event_id(event_id.into())?;
        Ok(Self {
            provider,
            event_id,
            status: EventStatus::Received,
            created_at,
        })
    }
}

/// Trims and validates a provider-assigned event id.
pub fn validate_event_id(event_id: String) -> Result<String, ValidationError> {
    let trimmed = event_id.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field("event_id"));
    }
    if trimmed.len() > 255 {
        return Err(ValidationError::invalid_format(
            "event_id",
            "longer than 255 characters",
        ));
    }
    Ok(trimmed.to_string())
}

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// True when this call created the record; false for a duplicate delivery.
    pub is_new: bool,
}

impl RecordOutcome {
    pub fn new_event() -> Self {
        Self { is_new: true }
    }

    pub fn duplicate() -> Self {
        Self { is_new: false }
    }
}
