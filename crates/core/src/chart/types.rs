//! Chart of accounts domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BusinessId, CategoryId};

use crate::ledger::types::Side;

/// Account classification.
///
/// The type decides which side increases the account:
/// - Asset/Expense accounts are debit-normal
/// - Liability/Equity/Revenue accounts are credit-normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Something the business owns (cash, receivables).
    Asset,
    /// Something the business owes.
    Liability,
    /// Owner's stake.
    Equity,
    /// Income earned.
    Revenue,
    /// Cost incurred.
    Expense,
}

impl AccountType {
    /// All account types in reporting order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the side that increases an account of this type.
    #[must_use]
    pub const fn normal_side(self) -> Side {
        match self {
            Self::Asset | Self::Expense => Side::Debit,
            Self::Liability | Self::Equity | Self::Revenue => Side::Credit,
        }
    }

    /// Returns the signed balance contribution of one line.
    ///
    /// Asset/Expense: `debit - credit`. Liability/Equity/Revenue: `credit - debit`.
    #[must_use]
    pub fn contribution(self, side: Side, amount: Decimal) -> Decimal {
        if side == self.normal_side() {
            amount
        } else {
            -amount
        }
    }

    /// Returns the lowercase name used in storage and APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// An account in a business's chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning business.
    pub business_id: BusinessId,
    /// Display name, unique within the business.
    pub name: String,
    /// Account code (e.g. "1000"), unique within the business.
    pub code: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Whether the account came from the seeded default chart.
    pub is_default: bool,
}

/// Input for adding a custom account to a chart.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Account code.
    pub code: String,
    /// Account classification.
    pub account_type: AccountType,
}

/// Whether a category records money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Money received: debit cash, credit the category account.
    Income,
    /// Money spent: debit the category account, credit cash.
    Expense,
}

impl CategoryKind {
    /// Returns the lowercase name used in storage and APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown category type: {s}")),
        }
    }
}

/// A user-facing income or expense category bound to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Owning business.
    pub business_id: BusinessId,
    /// Display name.
    pub name: String,
    /// Income or expense.
    pub kind: CategoryKind,
    /// The account this category posts against.
    pub account_id: AccountId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Asset, Side::Debit, dec!(10))]
    #[case(AccountType::Asset, Side::Credit, dec!(-10))]
    #[case(AccountType::Expense, Side::Debit, dec!(10))]
    #[case(AccountType::Expense, Side::Credit, dec!(-10))]
    #[case(AccountType::Liability, Side::Debit, dec!(-10))]
    #[case(AccountType::Liability, Side::Credit, dec!(10))]
    #[case(AccountType::Equity, Side::Credit, dec!(10))]
    #[case(AccountType::Revenue, Side::Credit, dec!(10))]
    #[case(AccountType::Revenue, Side::Debit, dec!(-10))]
    fn test_contribution_sign_convention(
        #[case] account_type: AccountType,
        #[case] side: Side,
        #[case] expected: Decimal,
    ) {
        assert_eq!(account_type.contribution(side, dec!(10)), expected);
    }

    #[test]
    fn test_account_type_round_trip() {
        for account_type in AccountType::ALL {
            let parsed: AccountType = account_type.as_str().parse().unwrap();
            assert_eq!(parsed, account_type);
        }
        assert!("bogus".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_category_kind_parse() {
        assert_eq!("Income".parse::<CategoryKind>().unwrap(), CategoryKind::Income);
        assert_eq!("expense".parse::<CategoryKind>().unwrap(), CategoryKind::Expense);
        assert!("transfer".parse::<CategoryKind>().is_err());
    }
}
