//! Reversing entries for voiding posted journal entries.
//!
//! A reversal never touches the original's rows. It is a new entry with the
//! same accounts and amounts and every side flipped.

use chrono::NaiveDate;

use super::error::LedgerError;
use super::types::{JournalEntry, NewJournalEntry, NewJournalLine};

/// Stateless builder for reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Builds the entry that cancels `original`.
    ///
    /// The reversal is dated `void_date` (not the original transaction date)
    /// and described as "Reversal of: <original description>".
    ///
    /// # Errors
    ///
    /// Returns `AlreadyVoided` if `original` is not posted, or
    /// `CannotVoidReversal` if it is itself a reversal.
    pub fn reversing_entry(
        original: &JournalEntry,
        void_date: NaiveDate,
    ) -> Result<NewJournalEntry, LedgerError> {
        if original.status.is_void() {
            return Err(LedgerError::AlreadyVoided(original.id));
        }
        if original.is_reversal() {
            return Err(LedgerError::CannotVoidReversal(original.id));
        }

        let lines = original
            .lines
            .iter()
            .map(|line| NewJournalLine {
                account_id: line.account_id,
                side: line.side.flip(),
                amount: line.amount,
            })
            .collect();

        Ok(NewJournalEntry {
            business_id: original.business_id,
            transaction_date: void_date,
            description: format!("Reversal of: {}", original.description),
            reverses_entry_id: Some(original.id),
            lines,
        })
    }
}
