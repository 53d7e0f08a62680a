//! `SeaORM` entity definitions.

pub mod accounts;
pub mod businesses;
pub mod categories;
pub mod exchange_rates;
pub mod journal_entries;
pub mod journal_lines;
pub mod sea_orm_active_enums;
pub mod transaction_records;
