//! In-memory view of one business's chart of accounts.

use std::collections::HashMap;

use tally_shared::types::{AccountId, BusinessId, CategoryId};

use super::types::{Account, Category, CategoryKind, NewAccount};
use crate::ledger::error::LedgerError;

/// A business's accounts, indexed by id and by exact name.
#[derive(Debug, Clone)]
pub struct ChartOfAccounts {
    business_id: BusinessId,
    accounts: Vec<Account>,
    by_id: HashMap<AccountId, usize>,
    by_name: HashMap<String, usize>,
}

impl ChartOfAccounts {
    /// Builds a chart from accounts loaded for `business_id`.
    ///
    /// Accounts belonging to other businesses are ignored.
    #[must_use]
    pub fn new(business_id: BusinessId, accounts: Vec<Account>) -> Self {
        let accounts: Vec<Account> = accounts
            .into_iter()
            .filter(|a| a.business_id == business_id)
            .collect();
        let by_id = accounts.iter().enumerate().map(|(i, a)| (a.id, i)).collect();
        let by_name = accounts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();

        Self {
            business_id,
            accounts,
            by_id,
            by_name,
        }
    }

    /// Returns the owning business.
    #[must_use]
    pub const fn business_id(&self) -> BusinessId {
        self.business_id
    }

    /// Returns all accounts in load order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountIdNotFound` if the account is not part of this chart.
    pub fn get(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.by_id
            .get(&id)
            .map(|&i| &self.accounts[i])
            .ok_or(LedgerError::AccountIdNotFound(id))
    }

    /// Resolves an account by exact (case-sensitive) name.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account has that name.
    pub fn resolve_by_name(&self, name: &str) -> Result<&Account, LedgerError> {
        self.by_name
            .get(name)
            .map(|&i| &self.accounts[i])
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))
    }

    /// Resolves the business's designated cash account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the chart has no account with that name.
    pub fn cash_account(&self, cash_account_name: &str) -> Result<&Account, LedgerError> {
        self.resolve_by_name(cash_account_name)
    }

    /// Binds a new category to the same-named account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when no account carries the category's name.
    pub fn bind_category(
        &self,
        id: CategoryId,
        name: &str,
        kind: CategoryKind,
    ) -> Result<Category, LedgerError> {
        let account = self.resolve_by_name(name)?;
        Ok(Category {
            id,
            business_id: self.business_id,
            name: name.to_string(),
            kind,
            account_id: account.id,
        })
    }

    /// Resolves the account a category posts against.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if the category belongs to another business,
    /// or `AccountIdNotFound` if its account is missing from this chart.
    pub fn category_account(&self, category: &Category) -> Result<&Account, LedgerError> {
        if category.business_id != self.business_id {
            return Err(LedgerError::CategoryNotFound(category.id));
        }
        self.get(category.account_id)
    }

    /// Validates a custom account and materializes it for this business.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the name or code is already taken, or
    /// `InvalidAccount` if either is blank.
    pub fn prepare_account(&self, input: NewAccount) -> Result<Account, LedgerError> {
        let name = input.name.trim();
        let code = input.code.trim();
        if name.is_empty() || code.is_empty() {
            return Err(LedgerError::InvalidAccount(
                "account name and code are required".to_string(),
            ));
        }
        if self.by_name.contains_key(name) {
            return Err(LedgerError::DuplicateAccount(name.to_string()));
        }
        if self.accounts.iter().any(|a| a.code == code) {
            return Err(LedgerError::DuplicateAccount(code.to_string()));
        }

        Ok(Account {
            id: AccountId::new(),
            business_id: self.business_id,
            name: name.to_string(),
            code: code.to_string(),
            account_type: input.account_type,
            is_default: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::defaults::{DEFAULT_CASH_ACCOUNT, default_accounts};
    use crate::chart::types::AccountType;

    fn chart() -> ChartOfAccounts {
        let business_id = BusinessId::new();
        ChartOfAccounts::new(business_id, default_accounts(business_id))
    }

    #[test]
    fn test_resolve_by_exact_name() {
        let chart = chart();
        let sales = chart.resolve_by_name("Sales").unwrap();
        assert_eq!(sales.account_type, AccountType::Revenue);
        assert!(matches!(
            chart.resolve_by_name("sales"),
            Err(LedgerError::AccountNotFound(name)) if name == "sales"
        ));
    }

    #[test]
    fn test_cash_account() {
        let chart = chart();
        assert_eq!(
            chart.cash_account(DEFAULT_CASH_ACCOUNT).unwrap().code,
            "1000"
        );
    }

    #[test]
    fn test_foreign_accounts_are_ignored() {
        let business_id = BusinessId::new();
        let mut accounts = default_accounts(business_id);
        let foreign = default_accounts(BusinessId::new());
        let foreign_id = foreign[0].id;
        accounts.extend(foreign);

        let chart = ChartOfAccounts::new(business_id, accounts);
        assert!(matches!(
            chart.get(foreign_id),
            Err(LedgerError::AccountIdNotFound(_))
        ));
    }

    #[test]
    fn test_bind_category_to_same_named_account() {
        let chart = chart();
        let category = chart
            .bind_category(CategoryId::new(), "Office Supplies", CategoryKind::Expense)
            .unwrap();
        let account = chart.category_account(&category).unwrap();
        assert_eq!(account.name, "Office Supplies");
    }

    #[test]
    fn test_bind_category_without_account_fails() {
        let chart = chart();
        let result = chart.bind_category(CategoryId::new(), "Crypto Gains", CategoryKind::Income);
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }

    #[test]
    fn test_category_from_other_business_is_rejected() {
        let other = chart();
        let chart = chart();
        let category = other
            .bind_category(CategoryId::new(), "Sales", CategoryKind::Income)
            .unwrap();
        assert!(matches!(
            chart.category_account(&category),
            Err(LedgerError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn test_prepare_account_rejects_duplicates() {
        let chart = chart();
        let duplicate_name = NewAccount {
            name: "Rent".to_string(),
            code: "9999".to_string(),
            account_type: AccountType::Expense,
        };
        assert!(matches!(
            chart.prepare_account(duplicate_name),
            Err(LedgerError::DuplicateAccount(_))
        ));

        let duplicate_code = NewAccount {
            name: "Parking".to_string(),
            code: "5200".to_string(),
            account_type: AccountType::Expense,
        };
        assert!(matches!(
            chart.prepare_account(duplicate_code),
            Err(LedgerError::DuplicateAccount(_))
        ));
    }

    #[test]
    fn test_prepare_account() {
        let chart = chart();
        let account = chart
            .prepare_account(NewAccount {
                name: " Parking ".to_string(),
                code: "5550".to_string(),
                account_type: AccountType::Expense,
            })
            .unwrap();
        assert_eq!(account.name, "Parking");
        assert_eq!(account.business_id, chart.business_id());
        assert!(!account.is_default);
    }
}
