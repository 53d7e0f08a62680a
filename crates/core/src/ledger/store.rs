//! Persistence contract for the ledger.
//!
//! Implementations must make each write atomic: an entry is visible with all
//! of its lines or not at all, and `mark_void` is a compare-and-set on the
//! posted status.

use async_trait::async_trait;
use tally_shared::types::{BusinessId, JournalEntryId};
use thiserror::Error;

use super::types::{EntryFilter, JournalEntry};
use crate::chart::Account;

/// Errors reported by a [`LedgerStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or state precondition did not hold.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row to update does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend failed.
    #[error("{0}")]
    Backend(String),
}

/// Storage for accounts and journal entries, scoped per business.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Loads a business's chart of accounts.
    async fn accounts(&self, business_id: BusinessId) -> Result<Vec<Account>, StoreError>;

    /// Inserts accounts in one write.
    ///
    /// Fails with `Conflict` if any name or code is already taken in its
    /// business; nothing is inserted in that case.
    async fn insert_accounts(&self, accounts: &[Account]) -> Result<(), StoreError>;

    /// Writes an entry and all of its lines as one unit.
    ///
    /// Fails with `Conflict` if another entry already reverses the same
    /// original.
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), StoreError>;

    /// Loads one entry with its lines.
    async fn find_entry(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError>;

    /// Loads the entry that reverses `original_id`, if one was written.
    async fn find_reversal(
        &self,
        business_id: BusinessId,
        original_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError>;

    /// Lists entries with their lines, ordered by transaction date then
    /// creation time.
    async fn list_entries(
        &self,
        business_id: BusinessId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    /// Flags a posted entry as void, pointing at its reversal.
    ///
    /// Fails with `Conflict` if the entry is no longer posted and `NotFound`
    /// if it does not exist.
    async fn mark_void(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
        reversal_entry_id: JournalEntryId,
    ) -> Result<(), StoreError>;
}
