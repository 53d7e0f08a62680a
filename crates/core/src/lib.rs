//! Core ledger engine for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence and exchange rates are reached through the [`ledger::LedgerStore`]
//! and [`currency::RateProvider`] traits.
//!
//! # Modules
//!
//! - `chart` - Chart of accounts, categories and the seeded default chart
//! - `currency` - Base-currency normalization and exchange rate lookup
//! - `ledger` - Double-entry posting, reversal and balances

pub mod chart;
pub mod currency;
pub mod ledger;
