//! In-memory DlqStore.
//!
//! Claims select and lease entries under one mutex, so overlapping runners in
//! the same process never receive the same entry twice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::foundation::{DlqEntryId, DomainError, ErrorCode};
use crate::domain::webhook::{DlqEntry, DlqStatus, Provider};
use crate::ports::DlqStore;

/// In-memory dead-letter queue.
#[derive(Default)]
pub struct InMemoryDlqStore {
    entries: Mutex<HashMap<DlqEntryId, DlqEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryDlqStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Simulates a storage outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Inserts a prepared entry as-is.
    pub async fn insert(&self, entry: DlqEntry) {
        self.entries.lock().await.insert(entry.id, entry);
    }

    /// Entries in the given status.
    pub async fn entries_with_status(&self, status: DlqStatus) -> Vec<DlqEntry> {
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("DLQ store unavailable"));
        }
        Ok(())
    }
}

fn not_found(id: DlqEntryId) -> DomainError {
    DomainError::new(ErrorCode::DlqEntryNotFound, "DLQ entry not found")
        .with_detail("entry_id", id.to_string())
}

#[async_trait]
impl DlqStore for InMemoryDlqStore {
    async fn enqueue(
        &self,
        provider: &Provider,
        payload: &serde_json::Value,
        error: &str,
        next_run_at: DateTime<Utc>,
    ) -> Result<DlqEntryId, DomainError> {
        self.check_available()?;
        let entry = DlqEntry::new(provider.clone(), payload.clone(), error, next_run_at, Utc::now());
        let id = entry.id;
        self.entries.lock().await.insert(id, entry);
        Ok(id)
    }

    async fn claim_due(
        &self,
        limit: u32,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<DlqEntry>, DomainError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;

        let mut due: Vec<&mut DlqEntry> = entries
            .values_mut()
            .filter(|e| e.is_claimable(now))
            .collect();
        due.sort_by_key(|e| e.next_run_at);

        let mut claimed = Vec::new();
        for entry in due.into_iter().take(limit as usize) {
            entry.claim(now, lease)?;
            claimed.push(entry.clone());
        }
        Ok(claimed)
    }

    async fn mark_succeeded(&self, id: DlqEntryId) -> Result<(), DomainError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.succeed(Utc::now())
    }

    async fn mark_failed(
        &self,
        id: DlqEntryId,
        error: &str,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.record_failure(error, next_run_at, Utc::now())
    }

    async fn mark_dead(&self, id: DlqEntryId, error: &str) -> Result<(), DomainError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.retire(error, Utc::now())
    }

    async fn find(&self, id: DlqEntryId) -> Result<Option<DlqEntry>, DomainError> {
        self.check_available()?;
        Ok(self.entries.lock().await.get(&id).cloned())
    }

    async fn backlog(&self) -> Result<u64, DomainError> {
        self.check_available()?;
        let entries = self.entries.lock().await;
        Ok(entries
            .values()
            .filter(|e| e.status == DlqStatus::Pending)
            .count() as u64)
    }
}
