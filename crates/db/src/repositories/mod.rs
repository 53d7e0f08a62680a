//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod business;
pub mod category;
pub mod exchange_rate;
pub mod ledger_store;
pub mod transaction_record;

pub use business::{BusinessError, BusinessRepository};
pub use category::{CategoryError, CategoryRepository};
pub use exchange_rate::{BusinessRates, ExchangeRateError, ExchangeRateRepository};
pub use ledger_store::SeaOrmLedgerStore;
pub use transaction_record::{
    TransactionRecord, TransactionRecordError, TransactionRecordRepository,
};

use sea_orm::{DbErr, SqlErr};

/// Returns true if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
