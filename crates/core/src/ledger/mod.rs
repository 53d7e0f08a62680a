//! Double-entry ledger engine.
//!
//! - `builder` turns categorized events into balanced entries
//! - `reversal` builds the equal-and-opposite entry used to void
//! - `balance` derives account balances from posted entries
//! - `validation` is the balance guard every entry passes before it is written
//! - `store` is the persistence contract, with an in-memory implementation
//! - `service` orchestrates all of the above
//! - `sync` records whether a raw transaction made it into the ledger

pub mod balance;
pub mod builder;
pub mod error;
pub mod memory;
pub mod reversal;
pub mod service;
pub mod store;
pub mod sync;
pub mod types;
pub mod validation;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, BalanceCalculator, TrialBalance};
pub use builder::JournalEntryBuilder;
pub use error::{ErrorKind, LedgerError};
pub use memory::InMemoryLedgerStore;
pub use reversal::ReversalService;
pub use service::{LedgerService, VoidOutcome};
pub use store::{LedgerStore, StoreError};
pub use sync::LedgerSync;
pub use types::{
    Business, EntryFilter, EntryStatus, EntryView, JournalEntry, JournalLine, LineView,
    NewJournalEntry, NewJournalLine, Posting, Side, TransactionEvent,
};
pub use validation::{BALANCE_TOLERANCE, EntryTotals, validate_lines};
