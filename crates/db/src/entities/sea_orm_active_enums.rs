//! `SeaORM` active enums backed by Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::{chart, ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "category_kind")]
pub enum CategoryKind {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
pub enum EntryStatus {
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "void")]
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "line_side")]
pub enum LineSide {
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "credit")]
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_status")]
pub enum LedgerStatus {
    #[sea_orm(string_value = "synced")]
    Synced,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<chart::AccountType> for AccountType {
    fn from(value: chart::AccountType) -> Self {
        match value {
            chart::AccountType::Asset => Self::Asset,
            chart::AccountType::Liability => Self::Liability,
            chart::AccountType::Equity => Self::Equity,
            chart::AccountType::Revenue => Self::Revenue,
            chart::AccountType::Expense => Self::Expense,
        }
    }
}

impl From<AccountType> for chart::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<chart::CategoryKind> for CategoryKind {
    fn from(value: chart::CategoryKind) -> Self {
        match value {
            chart::CategoryKind::Income => Self::Income,
            chart::CategoryKind::Expense => Self::Expense,
        }
    }
}

impl From<CategoryKind> for chart::CategoryKind {
    fn from(value: CategoryKind) -> Self {
        match value {
            CategoryKind::Income => Self::Income,
            CategoryKind::Expense => Self::Expense,
        }
    }
}

impl From<&ledger::EntryStatus> for EntryStatus {
    fn from(value: &ledger::EntryStatus) -> Self {
        match value {
            ledger::EntryStatus::Posted => Self::Posted,
            ledger::EntryStatus::Void { .. } => Self::Void,
        }
    }
}

impl From<ledger::Side> for LineSide {
    fn from(value: ledger::Side) -> Self {
        match value {
            ledger::Side::Debit => Self::Debit,
            ledger::Side::Credit => Self::Credit,
        }
    }
}

impl From<LineSide> for ledger::Side {
    fn from(value: LineSide) -> Self {
        match value {
            LineSide::Debit => Self::Debit,
            LineSide::Credit => Self::Credit,
        }
    }
}

impl From<&ledger::LedgerSync> for LedgerStatus {
    fn from(value: &ledger::LedgerSync) -> Self {
        match value {
            ledger::LedgerSync::Synced { .. } => Self::Synced,
            ledger::LedgerSync::Failed { .. } => Self::Failed,
        }
    }
}
