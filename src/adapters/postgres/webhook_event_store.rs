//! PostgreSQL implementation of WebhookEventStore.
//!
//! Idempotency comes from the `(provider, event_id)` primary key and
//! `ON CONFLICT DO NOTHING`: of any number of concurrent inserts for the same
//! pair, exactly one affects a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::db_error;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::{
    validate_event_id, EventStatus, Provider, RecordOutcome, WebhookEvent,
};
use crate::ports::WebhookEventStore;

/// PostgreSQL implementation of the WebhookEventStore port.
pub struct PostgresWebhookEventStore {
    pool: PgPool,
}

impl PostgresWebhookEventStore {
    /// Creates a new PostgresWebhookEventStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a webhook event.
#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    provider: String,
    event_id: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<WebhookEventRow> for WebhookEvent {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let provider = Provider::parse(&row.provider).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider: {}", e))
        })?;
        Ok(WebhookEvent {
            provider,
            event_id: row.event_id,
            status: EventStatus::parse(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl WebhookEventStore for PostgresWebhookEventStore {
    async fn record_if_new(
        &self,
        provider: &Provider,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, DomainError> {
        let event_id = validate_event_id(event_id.to_string())?;

        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (provider, event_id, status, created_at, updated_at)
            VALUES ($1, $2, 'RECEIVED', $3, $3)
            ON CONFLICT (provider, event_id) DO NOTHING
            "#,
        )
        .bind(provider.as_str())
        .bind(&event_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record webhook event"))?;

        Ok(RecordOutcome {
            is_new: result.rows_affected() == 1,
        })
    }

    async fn mark_status(
        &self,
        provider: &Provider,
        event_id: &str,
        status: EventStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events
            SET status = $3, updated_at = NOW()
            WHERE provider = $1 AND event_id = $2 AND status = 'RECEIVED'
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update webhook event status"))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.find(provider, event_id).await? {
            None => Err(DomainError::new(
                ErrorCode::WebhookEventNotFound,
                "Webhook event not recorded",
            )
            .with_detail("provider", provider.as_str())
            .with_detail("event_id", event_id)),
            Some(existing) => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot move webhook event from {} to {}",
                    existing.status, status
                ),
            )),
        }
    }

    async fn find(
        &self,
        provider: &Provider,
        event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT provider, event_id, status, created_at
            FROM webhook_events
            WHERE provider = $1 AND event_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load webhook event"))?;

        row.map(WebhookEvent::try_from).transpose()
    }
}
