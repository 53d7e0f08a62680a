//! Ledger domain types.
//!
//! A journal entry is a header plus two or more lines. Lines are immutable once
//! written; the only field of an entry that ever changes is its status, and
//! only from `Posted` to `Void`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BusinessId, CurrencyCode, JournalEntryId, JournalLineId};

use crate::chart::types::AccountType;

/// Side of a journal line.
///
/// What a debit or credit means (increase or decrease) depends on the account
/// type; see [`AccountType::normal_side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the lowercase name used in storage and APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a journal entry.
///
/// `Posted -> Void` is the only transition. A void entry points at the
/// reversing entry that cancelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum EntryStatus {
    /// Counts towards balances.
    Posted,
    /// Cancelled by `reversal_entry_id`; listed for audit, excluded from balances.
    Void {
        /// The entry that reverses this one.
        reversal_entry_id: JournalEntryId,
    },
}

impl EntryStatus {
    /// Returns true if the entry counts towards balances.
    #[must_use]
    pub const fn is_posted(&self) -> bool {
        matches!(self, Self::Posted)
    }

    /// Returns true if the entry has been voided.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void { .. })
    }

    /// Returns the reversing entry for a void entry.
    #[must_use]
    pub const fn reversal_entry_id(&self) -> Option<JournalEntryId> {
        match self {
            Self::Posted => None,
            Self::Void { reversal_entry_id } => Some(*reversal_entry_id),
        }
    }

    /// Returns the lowercase name used in storage and APIs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Posted => "posted",
            Self::Void { .. } => "void",
        }
    }
}

/// Anything that carries a side and an amount.
pub trait Posting {
    /// The line's side.
    fn side(&self) -> Side;
    /// The line's (non-negative) amount.
    fn amount(&self) -> Decimal;
}

/// A persisted journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: JournalLineId,
    /// Owning entry.
    pub journal_entry_id: JournalEntryId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: Side,
    /// Amount in the business's base currency.
    pub amount: Decimal,
}

impl Posting for JournalLine {
    fn side(&self) -> Side {
        self.side
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// A persisted journal entry with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Owning business.
    pub business_id: BusinessId,
    /// Date the economic event happened (or the void date for reversals).
    pub transaction_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Lifecycle state.
    pub status: EntryStatus,
    /// For reversing entries, the entry being cancelled.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// The entry's lines (at least two).
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Returns true if this entry is a reversal of another entry.
    #[must_use]
    pub const fn is_reversal(&self) -> bool {
        self.reverses_entry_id.is_some()
    }
}

/// A line of an entry that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalLine {
    /// Account to post to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub side: Side,
    /// Amount in the business's base currency.
    pub amount: Decimal,
}

impl Posting for NewJournalLine {
    fn side(&self) -> Side {
        self.side
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// An entry ready to be balance-checked and written as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    /// Owning business.
    pub business_id: BusinessId,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Set on reversing entries.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// Lines to write.
    pub lines: Vec<NewJournalLine>,
}

/// The business a posting is made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    /// Unique identifier.
    pub id: BusinessId,
    /// Display name.
    pub name: String,
    /// Currency every ledger amount is recorded in.
    pub base_currency: CurrencyCode,
}

/// A monetary event recorded by the user, before categorization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Date the event happened; also the as-of date for currency conversion.
    pub date: NaiveDate,
    /// Amount in `currency` (must be positive).
    pub amount: Decimal,
    /// Currency the amount was recorded in.
    pub currency: CurrencyCode,
    /// Free-text description.
    pub description: String,
}

/// Filter for listing entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only posted (`Some(false)`) or only void (`Some(true)`) entries.
    pub void: Option<bool>,
    /// Inclusive lower bound on the transaction date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date.
    pub date_to: Option<NaiveDate>,
}

impl EntryFilter {
    /// Only entries that count towards balances.
    #[must_use]
    pub const fn posted() -> Self {
        Self {
            void: Some(false),
            date_from: None,
            date_to: None,
        }
    }

    /// Returns true if `entry` passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.void.is_none_or(|void| entry.status.is_void() == void)
            && self.date_from.is_none_or(|from| entry.transaction_date >= from)
            && self.date_to.is_none_or(|to| entry.transaction_date <= to)
    }
}

/// A journal line annotated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineView {
    /// Line id.
    pub id: JournalLineId,
    /// Account id.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Account type, used for display grouping.
    pub account_type: AccountType,
    /// Debit or credit.
    pub side: Side,
    /// Amount in base currency.
    pub amount: Decimal,
}

/// A journal entry annotated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    /// Entry id.
    pub id: JournalEntryId,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Description.
    pub description: String,
    /// Lifecycle state.
    pub status: EntryStatus,
    /// For reversals, the entry being cancelled.
    pub reverses_entry_id: Option<JournalEntryId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// Annotated lines.
    pub lines: Vec<LineView>,
    /// Sum of debit lines.
    pub total_debit: Decimal,
    /// Sum of credit lines.
    pub total_credit: Decimal,
}
