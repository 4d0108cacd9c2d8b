//! Dead-letter queue entry for webhooks whose business handler failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Provider;
use crate::domain::foundation::{DlqEntryId, DomainError, ErrorCode};

/// Lifecycle of a DLQ entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DlqStatus {
    /// Waiting for its next retry.
    Pending,
    /// A retry succeeded; never claimed again.
    Succeeded,
    /// Retry budget exhausted; operator attention required.
    Dead,
}

impl DlqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DlqStatus::Pending => "PENDING",
            DlqStatus::Succeeded => "SUCCEEDED",
            DlqStatus::Dead => "DEAD",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "PENDING" => Ok(DlqStatus::Pending),
            "SUCCEEDED" => Ok(DlqStatus::Succeeded),
            "DEAD" => Ok(DlqStatus::Dead),
            other => Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid DLQ status: {}", other),
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DlqStatus::Pending)
    }
}

/// A webhook payload awaiting redelivery to its business handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlqEntry {
    pub id: DlqEntryId,
    pub provider: Provider,
    /// Original callback body, stored verbatim.
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub status: DlqStatus,
    /// Lease held by the runner that claimed this entry.
    pub claimed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DlqEntry {
    /// Creates a pending entry with zero attempts.
    pub fn new(
        provider: Provider,
        payload: serde_json::Value,
        error: impl Into<String>,
        next_run_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DlqEntryId::new(),
            provider,
            payload,
            attempts: 0,
            next_run_at,
            last_error: Some(error.into()),
            status: DlqStatus::Pending,
            claimed_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending, due, and not leased by another runner.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status == DlqStatus::Pending
            && self.next_run_at <= now
            && self.claimed_until.map_or(true, |until| until <= now)
    }

    /// Takes a lease on the entry.
    pub fn claim(&mut self, now: DateTime<Utc>, lease: Duration) -> Result<(), DomainError> {
        if !self.is_claimable(now) {
            return Err(self.transition_error("claim"));
        }
        let lease = chrono::Duration::from_std(lease).unwrap_or_else(|_| chrono::Duration::hours(1));
        self.claimed_until = Some(now + lease);
        self.updated_at = now;
        Ok(())
    }

    /// Records a failed retry and schedules the next one.
    ///
    /// `next_run_at` must be later than the current schedule; attempts only grow.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
        next_run_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status != DlqStatus::Pending {
            return Err(self.transition_error("reschedule"));
        }
        if next_run_at <= self.next_run_at {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "next_run_at must move forward",
            )
            .with_detail("entry_id", self.id.to_string()));
        }
        self.attempts += 1;
        self.next_run_at = next_run_at;
        self.last_error = Some(error.into());
        self.claimed_until = None;
        self.updated_at = now;
        Ok(())
    }

    /// Retires the entry after its final failed retry.
    pub fn retire(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != DlqStatus::Pending {
            return Err(self.transition_error("retire"));
        }
        self.attempts += 1;
        self.status = DlqStatus::Dead;
        self.last_error = Some(error.into());
        self.claimed_until = None;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the entry as successfully redelivered.
    pub fn succeed(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != DlqStatus::Pending {
            return Err(self.transition_error("complete"));
        }
        self.attempts += 1;
        self.status = DlqStatus::Succeeded;
        self.claimed_until = None;
        self.updated_at = now;
        Ok(())
    }

    fn transition_error(&self, action: &str) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot {} DLQ entry in status {}", action, self.status.as_str()),
        )
        .with_detail("entry_id", self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(now: DateTime<Utc>) -> DlqEntry {
        DlqEntry::new(Provider::Stripe, json!({"id": "evt_1"}), "boom", now, now)
    }

    #[test]
    fn new_entry_is_pending_with_zero_attempts() {
        let now = Utc::now();
        let entry = entry(now);
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.status, DlqStatus::Pending);
        assert_eq!(entry.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn entry_is_not_claimable_before_next_run_at() {
        let now = Utc::now();
        let mut entry = entry(now);
        entry.next_run_at = now + chrono::Duration::seconds(30);
        assert!(!entry.is_claimable(now));
        assert!(entry.is_claimable(now + chrono::Duration::seconds(30)));
    }

    #[test]
    fn claim_blocks_second_claim_until_lease_expires() {
        let now = Utc::now();
        let mut entry = entry(now);

        entry.claim(now, Duration::from_secs(60)).unwrap();
        assert!(entry.claim(now, Duration::from_secs(60)).is_err());
        assert!(entry.is_claimable(now + chrono::Duration::seconds(61)));
    }

    #[test]
    fn record_failure_moves_schedule_forward() {
        let now = Utc::now();
        let mut entry = entry(now);
        let next = now + chrono::Duration::seconds(30);

        entry.record_failure("still down", next, now).unwrap();

        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.next_run_at, next);
        assert_eq!(entry.last_error.as_deref(), Some("still down"));
        assert!(entry.claimed_until.is_none());
    }

    #[test]
    fn record_failure_rejects_backwards_schedule() {
        let now = Utc::now();
        let mut entry = entry(now);
        assert!(entry.record_failure("x", now, now).is_err());
        assert_eq!(entry.attempts, 0);
    }

    #[test]
    fn retired_entry_is_terminal() {
        let now = Utc::now();
        let mut entry = entry(now);
        entry.retire("gave up", now).unwrap();

        assert_eq!(entry.status, DlqStatus::Dead);
        assert!(entry.status.is_terminal());
        assert!(!entry.is_claimable(now + chrono::Duration::days(1)));
        assert!(entry.succeed(now).is_err());
    }

    #[test]
    fn succeeded_entry_is_never_claimable() {
        let now = Utc::now();
        let mut entry = entry(now);
        entry.succeed(now).unwrap();
        assert!(!entry.is_claimable(now + chrono::Duration::days(1)));
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [DlqStatus::Pending, DlqStatus::Succeeded, DlqStatus::Dead] {
            assert_eq!(DlqStatus::parse(status.as_str()).unwrap(), status);
        }
    }
}
