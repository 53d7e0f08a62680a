//! Chart of accounts.
//!
//! Every business posts against a fixed set of named, typed accounts. The
//! chart is seeded once per business and is read-mostly afterwards; accounts
//! referenced by a journal line are never deleted.
//!
//! Categories (the user-facing income/expense labels) are bound to an account
//! when they are created, so a category without a matching account is
//! rejected up front instead of failing at posting time.

pub mod defaults;
pub mod service;
pub mod types;

pub use defaults::{DEFAULT_CASH_ACCOUNT, DEFAULT_CHART, DefaultAccount, default_accounts};
pub use service::ChartOfAccounts;
pub use types::{Account, AccountType, Category, CategoryKind, NewAccount};
