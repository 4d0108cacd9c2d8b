//! PostgreSQL implementation of DlqStore.
//!
//! `claim_due` selects with `FOR UPDATE SKIP LOCKED` and sets the lease in the
//! same statement, so concurrent runner processes partition the due rows
//! between them instead of processing any row twice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::db_error;
use crate::domain::foundation::{DlqEntryId, DomainError, ErrorCode};
use crate::domain::webhook::{DlqEntry, DlqStatus, Provider};
use crate::ports::DlqStore;

const ENTRY_COLUMNS: &str = "id, provider, payload, attempts, next_run_at, last_error, \
                             status, claimed_until, created_at, updated_at";

/// PostgreSQL implementation of the DlqStore port.
pub struct PostgresDlqStore {
    pool: PgPool,
}

impl PostgresDlqStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explains why a guarded update touched no row.
    async fn rejected_update(&self, id: DlqEntryId, action: &str) -> DomainError {
        match self.find(id).await {
            Ok(None) => DomainError::new(ErrorCode::DlqEntryNotFound, "DLQ entry not found")
                .with_detail("entry_id", id.to_string()),
            Ok(Some(entry)) => DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot {} DLQ entry in status {}", action, entry.status.as_str()),
            )
            .with_detail("entry_id", id.to_string()),
            Err(e) => e,
        }
    }
}

/// Database row representation of a DLQ entry.
#[derive(Debug, sqlx::FromRow)]
struct DlqEntryRow {
    id: Uuid,
    provider: String,
    payload: serde_json::Value,
    attempts: i32,
    next_run_at: DateTime<Utc>,
    last_error: Option<String>,
    status: String,
    claimed_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DlqEntryRow> for DlqEntry {
    type Error = DomainError;

    fn try_from(row: DlqEntryRow) -> Result<Self, Self::Error> {
        let provider = Provider::parse(&row.provider).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider: {}", e))
        })?;
        let attempts = u32::try_from(row.attempts).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid attempts value: {}", row.attempts),
            )
        })?;

        Ok(DlqEntry {
            id: DlqEntryId::from_uuid(row.id),
            provider,
            payload: row.payload,
            attempts,
            next_run_at: row.next_run_at,
            last_error: row.last_error,
            status: DlqStatus::parse(&row.status)?,
            claimed_until: row.claimed_until,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl DlqStore for PostgresDlqStore {
    async fn enqueue(
        &self,
        provider: &Provider,
        payload: &serde_json::Value,
        error: &str,
        next_run_at: DateTime<Utc>,
    ) -> Result<DlqEntryId, DomainError> {
        let id = DlqEntryId::new();

        sqlx::query(
            r#"
            INSERT INTO webhook_dlq (id, provider, payload, attempts, next_run_at, last_error, status)
            VALUES ($1, $2, $3, 0, $4, $5, 'PENDING')
            "#,
        )
        .bind(id.as_uuid())
        .bind(provider.as_str())
        .bind(payload)
        .bind(next_run_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to enqueue DLQ entry"))?;

        Ok(id)
    }

    async fn claim_due(
        &self,
        limit: u32,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<DlqEntry>, DomainError> {
        let lease = chrono::Duration::from_std(lease).unwrap_or_else(|_| chrono::Duration::hours(1));
        let limit = i64::from(limit);

        let rows: Vec<DlqEntryRow> = sqlx::query_as(&format!(
            r#"
            UPDATE webhook_dlq
            SET claimed_until = $2, updated_at = $1
            WHERE id IN (
                SELECT id FROM webhook_dlq
                WHERE status = 'PENDING'
                  AND next_run_at <= $1
                  AND (claimed_until IS NULL OR claimed_until <= $1)
                ORDER BY next_run_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(now)
        .bind(now + lease)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to claim DLQ entries"))?;

        let mut entries = rows
            .into_iter()
            .map(DlqEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        // RETURNING does not preserve the subquery order
        entries.sort_by_key(|e| e.next_run_at);
        Ok(entries)
    }

    async fn mark_succeeded(&self, id: DlqEntryId) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_dlq
            SET status = 'SUCCEEDED', attempts = attempts + 1,
                claimed_until = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark DLQ entry succeeded"))?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(id, "complete").await);
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: DlqEntryId,
        error: &str,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_dlq
            SET attempts = attempts + 1, next_run_at = $3, last_error = $2,
                claimed_until = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING' AND next_run_at < $3
            "#,
        )
        .bind(id.as_uuid())
        .bind(error)
        .bind(next_run_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to reschedule DLQ entry"))?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(id, "reschedule").await);
        }
        Ok(())
    }

    async fn mark_dead(&self, id: DlqEntryId, error: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_dlq
            SET status = 'DEAD', attempts = attempts + 1, last_error = $2,
                claimed_until = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id.as_uuid())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to retire DLQ entry"))?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(id, "retire").await);
        }
        Ok(())
    }

    async fn find(&self, id: DlqEntryId) -> Result<Option<DlqEntry>, DomainError> {
        let row: Option<DlqEntryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM webhook_dlq WHERE id = $1",
            ENTRY_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load DLQ entry"))?;

        row.map(DlqEntry::try_from).transpose()
    }

    async fn backlog(&self) -> Result<u64, DomainError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM webhook_dlq WHERE status = 'PENDING'")
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to count DLQ backlog"))?;

        Ok(count.max(0) as u64)
    }
}
