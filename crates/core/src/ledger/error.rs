//! Ledger error types.
//!
//! Every failure the engine reports is one of these variants. [`ErrorKind`]
//! groups them into the coarse classes callers usually branch on.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{AccountId, BusinessId, CategoryId, JournalEntryId};
use thiserror::Error;

use super::store::StoreError;
use crate::currency::RateError;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was malformed or would unbalance the ledger.
    Validation,
    /// A referenced account, category, business or entry does not exist.
    NotFound,
    /// The request conflicts with current state.
    Conflict,
    /// No exchange rate applies.
    RateUnavailable,
    /// The store failed.
    Persistence,
    /// A reversal was committed but the original could not be flagged void.
    Critical,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// An entry must have at least two lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Debits and credits differ by more than the tolerance.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amounts cannot be negative.
    #[error("Line amount cannot be negative")]
    NegativeAmount,

    /// Transaction amounts must be positive.
    #[error("Transaction amount must be greater than zero")]
    ZeroAmount,

    /// The amount does not fit in a ledger amount (below 10^15).
    #[error("Amount {0} exceeds the maximum ledger amount")]
    AmountOutOfRange(Decimal),

    /// Reversing entries are not voided themselves; repost the original instead.
    #[error("Journal entry {0} is a reversal and cannot be voided")]
    CannotVoidReversal(JournalEntryId),

    /// Account input was rejected.
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    // ========== Lookup Errors ==========
    /// No account with that exact name exists in the business's chart.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The account id is not part of the business's chart.
    #[error("Account not found: {0}")]
    AccountIdNotFound(AccountId),

    /// Category not found (or owned by another business).
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Business not found.
    #[error("Business not found: {0}")]
    BusinessNotFound(BusinessId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    // ========== Conflict Errors ==========
    /// Account name or code already used in this business.
    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    /// The entry is already void.
    #[error("Journal entry {0} is already void")]
    AlreadyVoided(JournalEntryId),

    // ========== Currency Errors ==========
    /// No exchange rate for the pair on or before the date.
    #[error("No exchange rate found for {from} to {to} on {date}")]
    RateUnavailable {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// Date for which the rate was requested.
        date: NaiveDate,
    },

    /// A manual exchange rate was rejected.
    #[error("Invalid exchange rate: {0}")]
    InvalidExchangeRate(String),

    /// The rate collaborator itself failed.
    #[error("Exchange rate lookup failed: {0}")]
    RateSource(String),

    // ========== Persistence Errors ==========
    /// The ledger store failed.
    #[error("Ledger store error: {0}")]
    Persistence(#[from] StoreError),

    /// The reversal is committed but the original is still posted.
    ///
    /// Requires manual reconciliation: the original must be flagged void by
    /// hand, pointing at `reversal`.
    #[error(
        "Void of {original} left ledger inconsistent: reversal {reversal} committed but original still posted: {source}"
    )]
    VoidInconsistent {
        /// The entry that was being voided.
        original: JournalEntryId,
        /// The committed reversing entry.
        reversal: JournalEntryId,
        /// Why the status flip failed.
        source: StoreError,
    },
}

impl LedgerError {
    /// Returns the coarse error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines
            | Self::Unbalanced { .. }
            | Self::NegativeAmount
            | Self::ZeroAmount
            | Self::AmountOutOfRange(_)
            | Self::CannotVoidReversal(_)
            | Self::InvalidAccount(_)
            | Self::InvalidExchangeRate(_) => ErrorKind::Validation,
            Self::AccountNotFound(_)
            | Self::AccountIdNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::BusinessNotFound(_)
            | Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateAccount(_) | Self::AlreadyVoided(_) => ErrorKind::Conflict,
            Self::RateUnavailable { .. } => ErrorKind::RateUnavailable,
            Self::RateSource(_) | Self::Persistence(_) => ErrorKind::Persistence,
            Self::VoidInconsistent { .. } => ErrorKind::Critical,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::CannotVoidReversal(_) => "CANNOT_VOID_REVERSAL",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::AccountNotFound(_) | Self::AccountIdNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::BusinessNotFound(_) => "BUSINESS_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::InvalidExchangeRate(_) => "INVALID_EXCHANGE_RATE",
            Self::RateSource(_) => "RATE_SOURCE_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::VoidInconsistent { .. } => "VOID_INCONSISTENT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::RateUnavailable => 422,
            ErrorKind::Persistence | ErrorKind::Critical => 500,
        }
    }

    /// Returns true if the error left the ledger in a state that needs manual
    /// reconciliation.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.kind(), ErrorKind::Critical)
    }
}

impl From<RateError> for LedgerError {
    fn from(err: RateError) -> Self {
        let message = err.to_string();
        match err {
            RateError::Unavailable { from, to, date } => Self::RateUnavailable {
                from: from.to_string(),
                to: to.to_string(),
                date,
            },
            RateError::InvalidRate | RateError::SameCurrency(_) => {
                Self::InvalidExchangeRate(message)
            }
            RateError::Overflow { amount, .. } => Self::AmountOutOfRange(amount),
            RateError::Source(msg) => Self::RateSource(msg),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        if matches!(err, LedgerError::RateSource(_)) {
            return Self::ExternalService(message);
        }
        match err.kind() {
            ErrorKind::Validation | ErrorKind::RateUnavailable => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Persistence => Self::Database(message),
            ErrorKind::Critical => Self::Inconsistent(message),
        }
    }
}
