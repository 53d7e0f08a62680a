//! Seeded default chart of accounts.

use tally_shared::types::{AccountId, BusinessId};

use super::types::{Account, AccountType};

/// Name of the default cash account.
pub const DEFAULT_CASH_ACCOUNT: &str = "Cash";

/// One account in the default chart.
#[derive(Debug, Clone, Copy)]
pub struct DefaultAccount {
    /// Account code.
    pub code: &'static str,
    /// Account name.
    pub name: &'static str,
    /// Account type.
    pub account_type: AccountType,
}

const fn account(code: &'static str, name: &'static str, account_type: AccountType) -> DefaultAccount {
    DefaultAccount {
        code,
        name,
        account_type,
    }
}

/// The chart every new business starts with.
///
/// Income and expense categories of the same names can be bound directly.
pub const DEFAULT_CHART: &[DefaultAccount] = &[
    account("1000", DEFAULT_CASH_ACCOUNT, AccountType::Asset),
    account("1100", "Accounts Receivable", AccountType::Asset),
    account("1500", "Equipment", AccountType::Asset),
    account("2000", "Accounts Payable", AccountType::Liability),
    account("2100", "Credit Card", AccountType::Liability),
    account("2500", "Loans Payable", AccountType::Liability),
    account("3000", "Owner's Equity", AccountType::Equity),
    account("3100", "Owner's Draw", AccountType::Equity),
    account("4000", "Sales", AccountType::Revenue),
    account("4100", "Service Revenue", AccountType::Revenue),
    account("4200", "Interest Income", AccountType::Revenue),
    account("4900", "Other Income", AccountType::Revenue),
    account("5000", "Cost of Goods Sold", AccountType::Expense),
    account("5100", "Office Supplies", AccountType::Expense),
    account("5200", "Rent", AccountType::Expense),
    account("5300", "Utilities", AccountType::Expense),
    account("5400", "Salaries", AccountType::Expense),
    account("5500", "Travel", AccountType::Expense),
    account("5600", "Meals", AccountType::Expense),
    account("5700", "Marketing", AccountType::Expense),
    account("5800", "Software", AccountType::Expense),
    account("5900", "Bank Fees", AccountType::Expense),
    account("6000", "Insurance", AccountType::Expense),
    account("6900", "Other Expenses", AccountType::Expense),
];

/// Materializes the default chart for a business with fresh account ids.
#[must_use]
pub fn default_accounts(business_id: BusinessId) -> Vec<Account> {
    DEFAULT_CHART
        .iter()
        .map(|d| Account {
            id: AccountId::new(),
            business_id,
            name: d.name.to_string(),
            code: d.code.to_string(),
            account_type: d.account_type,
            is_default: true,
        })
        .collect()
}
