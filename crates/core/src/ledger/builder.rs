//! Turns categorized events into balanced journal entries.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{JournalEntryId, JournalLineId};

use super::error::LedgerError;
use super::types::{EntryStatus, JournalEntry, JournalLine, NewJournalEntry, NewJournalLine, Side};
use super::validation::validate_lines;
use crate::chart::{Category, CategoryKind, ChartOfAccounts};

/// Builds journal entries against one business's chart of accounts.
#[derive(Debug, Clone, Copy)]
pub struct JournalEntryBuilder<'a> {
    chart: &'a ChartOfAccounts,
    cash_account_name: &'a str,
}

impl<'a> JournalEntryBuilder<'a> {
    /// Creates a builder posting cash movements to `cash_account_name`.
    #[must_use]
    pub const fn new(chart: &'a ChartOfAccounts, cash_account_name: &'a str) -> Self {
        Self {
            chart,
            cash_account_name,
        }
    }

    /// Builds the two-line entry for a categorized event.
    ///
    /// Income debits cash and credits the category's account; expense debits
    /// the category's account and credits cash. `base_amount` must already be
    /// in the business's base currency.
    ///
    /// # Errors
    ///
    /// - `ZeroAmount` / `NegativeAmount` for a non-positive amount
    /// - `AccountNotFound` if the cash account is missing from the chart
    /// - `CategoryNotFound` / `AccountIdNotFound` if the category does not
    ///   resolve in this chart
    pub fn categorized(
        &self,
        category: &Category,
        transaction_date: NaiveDate,
        description: &str,
        base_amount: Decimal,
    ) -> Result<NewJournalEntry, LedgerError> {
        if base_amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if base_amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }

        let category_account = self.chart.category_account(category)?;
        let cash = self.chart.cash_account(self.cash_account_name)?;

        let (debit, credit) = match category.kind {
            CategoryKind::Income => (cash.id, category_account.id),
            CategoryKind::Expense => (category_account.id, cash.id),
        };

        let entry = NewJournalEntry {
            business_id: self.chart.business_id(),
            transaction_date,
            description: description.to_string(),
            reverses_entry_id: None,
            lines: vec![
                NewJournalLine {
                    account_id: debit,
                    side: Side::Debit,
                    amount: base_amount,
                },
                NewJournalLine {
                    account_id: credit,
                    side: Side::Credit,
                    amount: base_amount,
                },
            ],
        };
        validate_lines(&entry.lines)?;
        Ok(entry)
    }

    /// Validates an entry and assigns ids, producing the row set to write.
    ///
    /// This is the one path every entry takes before reaching the store,
    /// including reversals.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientLines`, `NegativeAmount` or `Unbalanced` from the
    /// balance guard, or `AccountIdNotFound` if a line references an account
    /// outside the chart.
    pub fn finalize(
        &self,
        entry: NewJournalEntry,
        created_at: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        validate_lines(&entry.lines)?;
        for line in &entry.lines {
            self.chart.get(line.account_id)?;
        }

        let id = JournalEntryId::new();
        let lines = entry
            .lines
            .into_iter()
            .map(|l| JournalLine {
                id: JournalLineId::new(),
                journal_entry_id: id,
                account_id: l.account_id,
                side: l.side,
                amount: l.amount,
            })
            .collect();

        Ok(JournalEntry {
            id,
            business_id: self.chart.business_id(),
            transaction_date: entry.transaction_date,
            description: entry.description,
            status: EntryStatus::Posted,
            reverses_entry_id: entry.reverses_entry_id,
            created_at,
            lines,
        })
    }
}
