//! Ledger sync outcome for raw transaction records.
//!
//! The application keeps the user's recorded event even when posting it to the
//! ledger fails. The record then carries a `failed` status, and the failure is
//! logged as "ledger sync failed" so it can be told apart from other errors.

use serde::{Deserialize, Serialize};
use tally_shared::types::{BusinessId, JournalEntryId, TransactionRecordId};
use tracing::warn;

use super::error::LedgerError;
use super::types::JournalEntry;

/// Whether a raw transaction record made it into the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "ledger_status", rename_all = "lowercase")]
pub enum LedgerSync {
    /// Posted as `journal_entry_id`.
    Synced {
        /// The entry created for the record.
        journal_entry_id: JournalEntryId,
    },
    /// Posting failed; the record is kept without a ledger entry.
    Failed {
        /// Error message from the ledger.
        reason: String,
    },
}

impl LedgerSync {
    /// Derives the sync state from a posting result, logging failures.
    #[must_use]
    pub fn from_post(
        business_id: BusinessId,
        record_id: TransactionRecordId,
        result: &Result<JournalEntry, LedgerError>,
    ) -> Self {
        match result {
            Ok(entry) => Self::Synced {
                journal_entry_id: entry.id,
            },
            Err(err) => {
                warn!(
                    %business_id,
                    %record_id,
                    error_code = err.error_code(),
                    error = %err,
                    "ledger sync failed"
                );
                Self::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Returns the stored status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced { .. } => "synced",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns the journal entry for a synced record.
    #[must_use]
    pub const fn journal_entry_id(&self) -> Option<JournalEntryId> {
        match self {
            Self::Synced { journal_entry_id } => Some(*journal_entry_id),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the failure message for a failed record.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Synced { .. } => None,
            Self::Failed { reason } => Some(reason),
        }
    }
}
