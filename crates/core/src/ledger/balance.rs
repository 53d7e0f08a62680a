//! Account balance calculations.
//!
//! Void entries and the reversals that cancel them are both listed, but
//! neither counts towards a balance. A reversal whose original is somehow
//! still posted does count, and nets the original to zero.
//!
//! Sign convention by account type:
//! - Asset/Expense: `debit - credit`
//! - Liability/Equity/Revenue: `credit - debit`

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{AccountId, JournalEntryId};

use super::error::LedgerError;
use super::types::{JournalEntry, Side};
use super::validation::BALANCE_TOLERANCE;
use crate::chart::{AccountType, ChartOfAccounts};

/// Totals and signed balance for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Signed balance under the account type's convention.
    pub balance: Decimal,
}

impl AccountBalance {
    fn add(&mut self, side: Side, amount: Decimal) {
        match side {
            Side::Debit => self.debit_total += amount,
            Side::Credit => self.credit_total += amount,
        }
        self.balance += self.account_type.contribution(side, amount);
    }
}

/// Per-account totals over posted entries, with grand totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    /// One row per account, in chart order.
    pub accounts: Vec<AccountBalance>,
    /// Sum of every posted debit.
    pub total_debit: Decimal,
    /// Sum of every posted credit.
    pub total_credit: Decimal,
    /// Whether the grand totals agree within tolerance.
    pub is_balanced: bool,
}

/// Stateless balance calculator.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Signed balance of one account.
    ///
    /// # Errors
    ///
    /// Returns `AccountIdNotFound` if the account is not in the chart.
    pub fn account_balance(
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        account_id: AccountId,
    ) -> Result<Decimal, LedgerError> {
        let account_type = chart.get(account_id)?.account_type;
        Ok(counted_lines(entries)
            .filter(|(account, _, _)| *account == account_id)
            .map(|(_, side, amount)| account_type.contribution(side, amount))
            .sum())
    }

    /// The business's cash position: the balance of its cash account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the chart has no such cash account.
    pub fn cash_position(
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
        cash_account_name: &str,
    ) -> Result<Decimal, LedgerError> {
        let cash = chart.cash_account(cash_account_name)?;
        Self::account_balance(chart, entries, cash.id)
    }

    /// Totals for every account in the chart, zero rows included.
    ///
    /// Lines referencing accounts outside the chart are ignored.
    #[must_use]
    pub fn account_balances(
        chart: &ChartOfAccounts,
        entries: &[JournalEntry],
    ) -> Vec<AccountBalance> {
        let mut rows: Vec<AccountBalance> = chart
            .accounts()
            .iter()
            .map(|a| AccountBalance {
                account_id: a.id,
                code: a.code.clone(),
                name: a.name.clone(),
                account_type: a.account_type,
                debit_total: Decimal::ZERO,
                credit_total: Decimal::ZERO,
                balance: Decimal::ZERO,
            })
            .collect();
        let index: HashMap<AccountId, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.account_id, i))
            .collect();

        for (account_id, side, amount) in counted_lines(entries) {
            if let Some(&i) = index.get(&account_id) {
                rows[i].add(side, amount);
            }
        }
        rows
    }

    /// Trial balance over posted entries.
    #[must_use]
    pub fn trial_balance(chart: &ChartOfAccounts, entries: &[JournalEntry]) -> TrialBalance {
        let accounts = Self::account_balances(chart, entries);
        let total_debit: Decimal = accounts.iter().map(|a| a.debit_total).sum();
        let total_credit: Decimal = accounts.iter().map(|a| a.credit_total).sum();

        TrialBalance {
            accounts,
            total_debit,
            total_credit,
            is_balanced: (total_debit - total_credit).abs() <= BALANCE_TOLERANCE,
        }
    }
}

/// Lines of entries that count towards balances.
///
/// `entries` must include void entries so their reversals can be recognized.
fn counted_lines(
    entries: &[JournalEntry],
) -> impl Iterator<Item = (AccountId, Side, Decimal)> + '_ {
    let voided: HashSet<JournalEntryId> = entries
        .iter()
        .filter(|e| e.status.is_void())
        .map(|e| e.id)
        .collect();
    entries
        .iter()
        .filter(move |e| {
            e.status.is_posted() && e.reverses_entry_id.is_none_or(|id| !voided.contains(&id))
        })
        .flat_map(|e| e.lines.iter().map(|l| (l.account_id, l.side, l.amount)))
}
