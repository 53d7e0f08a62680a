//! In-memory [`LedgerStore`].
//!
//! Every write happens under one lock guard, so entries become visible with
//! all of their lines at once.

use async_trait::async_trait;
use tally_shared::types::{BusinessId, JournalEntryId};
use tokio::sync::RwLock;

use super::store::{LedgerStore, StoreError};
use super::types::{EntryFilter, EntryStatus, JournalEntry};
use crate::chart::Account;

#[derive(Debug, Default)]
struct Inner {
    accounts: Vec<Account>,
    entries: Vec<JournalEntry>,
}

/// A ledger store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all businesses, void ones included.
    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Number of lines across all entries.
    pub async fn line_count(&self) -> usize {
        self.inner
            .read()
            .await
            .entries
            .iter()
            .map(|e| e.lines.len())
            .sum()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn accounts(&self, business_id: BusinessId) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .iter()
            .filter(|a| a.business_id == business_id)
            .cloned()
            .collect())
    }

    async fn insert_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for (i, account) in accounts.iter().enumerate() {
            let taken = inner
                .accounts
                .iter()
                .chain(&accounts[..i])
                .any(|a| {
                    a.business_id == account.business_id
                        && (a.name == account.name || a.code == account.code)
                });
            if taken {
                return Err(StoreError::Conflict(format!(
                    "account {} ({}) already exists",
                    account.name, account.code
                )));
            }
        }
        inner.accounts.extend_from_slice(accounts);
        Ok(())
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(original) = entry.reverses_entry_id
            && inner
                .entries
                .iter()
                .any(|e| e.reverses_entry_id == Some(original))
        {
            return Err(StoreError::Conflict(format!(
                "entry {original} already has a reversal"
            )));
        }
        inner.entries.push(entry.clone());
        Ok(())
    }

    async fn find_entry(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.id == entry_id && e.business_id == business_id)
            .cloned())
    }

    async fn find_reversal(
        &self,
        business_id: BusinessId,
        original_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.business_id == business_id && e.reverses_entry_id == Some(original_id))
            .cloned())
    }

    async fn list_entries(
        &self,
        business_id: BusinessId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries: Vec<JournalEntry> = self
            .inner
            .read()
            .await
            .entries
            .iter()
            .filter(|e| e.business_id == business_id && filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.transaction_date, e.created_at, e.id));
        Ok(entries)
    }

    async fn mark_void(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
        reversal_entry_id: JournalEntryId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.business_id == business_id)
            .ok_or_else(|| StoreError::NotFound(format!("journal entry {entry_id}")))?;
        if !entry.status.is_posted() {
            return Err(StoreError::Conflict(format!(
                "journal entry {entry_id} is not posted"
            )));
        }
        entry.status = EntryStatus::Void { reversal_entry_id };
        Ok(())
    }
}
