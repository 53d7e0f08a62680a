//! Ledger service: posting, voiding, listing and balances.
//!
//! Pure orchestration over a [`LedgerStore`] and a [`RateProvider`]. Every
//! validation and lookup runs before the first write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{
    AccountId, BusinessId, CategoryId, JournalEntryId, PageRequest, PageResponse,
};
use tracing::{error, info, warn};

use super::balance::{AccountBalance, BalanceCalculator, TrialBalance};
use super::builder::JournalEntryBuilder;
use super::error::LedgerError;
use super::reversal::ReversalService;
use super::store::{LedgerStore, StoreError};
use super::types::{
    Business, EntryFilter, EntryStatus, EntryView, JournalEntry, LineView, NewJournalEntry,
    TransactionEvent,
};
use super::validation::EntryTotals;
use crate::chart::{
    Account, Category, CategoryKind, ChartOfAccounts, DEFAULT_CASH_ACCOUNT, NewAccount,
    default_accounts,
};
use crate::currency::{CurrencyNormalizer, RateProvider, is_storable};

/// Result of a successful void.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoidOutcome {
    /// The original entry, now void.
    pub original: JournalEntry,
    /// The committed reversing entry.
    pub reversal: JournalEntry,
}

/// The ledger engine.
pub struct LedgerService<S: LedgerStore + ?Sized, R: RateProvider + ?Sized> {
    store: Arc<S>,
    rates: Arc<R>,
    cash_account_name: String,
}

impl<S: LedgerStore + ?Sized, R: RateProvider + ?Sized> Clone for LedgerService<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rates: Arc::clone(&self.rates),
            cash_account_name: self.cash_account_name.clone(),
        }
    }
}

impl<S: LedgerStore + ?Sized, R: RateProvider + ?Sized> LedgerService<S, R> {
    /// Creates a service posting cash movements to the default "Cash" account.
    #[must_use]
    pub fn new(store: Arc<S>, rates: Arc<R>) -> Self {
        Self {
            store,
            rates,
            cash_account_name: DEFAULT_CASH_ACCOUNT.to_string(),
        }
    }

    /// Uses a different account name as every business's cash account.
    #[must_use]
    pub fn with_cash_account(mut self, name: impl Into<String>) -> Self {
        self.cash_account_name = name.into();
        self
    }

    /// Returns the cash account name.
    #[must_use]
    pub fn cash_account_name(&self) -> &str {
        &self.cash_account_name
    }

    /// Loads a business's chart of accounts.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn chart(&self, business_id: BusinessId) -> Result<ChartOfAccounts, LedgerError> {
        let accounts = self.store.accounts(business_id).await?;
        Ok(ChartOfAccounts::new(business_id, accounts))
    }

    /// Seeds the default chart unless the business already has accounts.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn seed_default_chart(
        &self,
        business_id: BusinessId,
    ) -> Result<ChartOfAccounts, LedgerError> {
        let chart = self.chart(business_id).await?;
        if !chart.is_empty() {
            return Ok(chart);
        }

        let accounts = default_accounts(business_id);
        self.store.insert_accounts(&accounts).await?;
        info!(%business_id, accounts = accounts.len(), "seeded default chart of accounts");
        Ok(ChartOfAccounts::new(business_id, accounts))
    }

    /// Adds a custom account to a business's chart.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the name or code is taken, `InvalidAccount`
    /// for blank input, or `Persistence` if the store fails.
    pub async fn add_account(
        &self,
        business_id: BusinessId,
        input: NewAccount,
    ) -> Result<Account, LedgerError> {
        let chart = self.chart(business_id).await?;
        let account = chart.prepare_account(input)?;
        match self.store.insert_accounts(std::slice::from_ref(&account)).await {
            Ok(()) => Ok(account),
            Err(StoreError::Conflict(_)) => Err(LedgerError::DuplicateAccount(account.name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Binds a new category to the account of the same name.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no account carries the category's name.
    pub async fn bind_category(
        &self,
        business_id: BusinessId,
        id: CategoryId,
        name: &str,
        kind: CategoryKind,
    ) -> Result<Category, LedgerError> {
        self.chart(business_id).await?.bind_category(id, name, kind)
    }

    /// Posts a categorized transaction.
    ///
    /// The amount is normalized into the business's base currency as of the
    /// event date, then written as a balanced two-line entry.
    ///
    /// # Errors
    ///
    /// - `CategoryNotFound` if the category belongs to another business
    /// - `ZeroAmount` / `NegativeAmount` for a non-positive amount, or one
    ///   that rounds to zero in the base currency
    /// - `AmountOutOfRange` if the amount (or its conversion) is 10^15 or more
    /// - `RateUnavailable` if the amount cannot be converted
    /// - `AccountNotFound` / `AccountIdNotFound` if an account does not resolve
    /// - `Persistence` if the write fails (nothing is written)
    pub async fn post(
        &self,
        business: &Business,
        category: &Category,
        event: &TransactionEvent,
    ) -> Result<JournalEntry, LedgerError> {
        if category.business_id != business.id {
            return Err(LedgerError::CategoryNotFound(category.id));
        }
        if event.amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if event.amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if !is_storable(event.amount) {
            return Err(LedgerError::AmountOutOfRange(event.amount));
        }

        let chart = self.chart(business.id).await?;
        // resolve accounts before the rate call so lookup failures never hit the provider
        chart.category_account(category)?;
        chart.cash_account(&self.cash_account_name)?;

        let normalized = CurrencyNormalizer::new(self.rates.as_ref())
            .normalize(
                event.amount,
                &event.currency,
                &business.base_currency,
                event.date,
            )
            .await?;
        // tiny foreign amounts can round away entirely
        if normalized.base_amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let builder = JournalEntryBuilder::new(&chart, &self.cash_account_name);
        let new_entry =
            builder.categorized(category, event.date, &event.description, normalized.base_amount)?;
        let entry = self.write(&chart, new_entry).await?;

        info!(
            business_id = %business.id,
            entry_id = %entry.id,
            category = %category.name,
            amount = %normalized.base_amount,
            currency = %event.currency,
            rate = %normalized.rate,
            "posted journal entry"
        );
        Ok(entry)
    }

    /// Posts an arbitrary entry through the balance guard.
    ///
    /// # Errors
    ///
    /// Returns balance-guard errors, `AccountIdNotFound` for lines outside the
    /// chart, or `Persistence` if the write fails.
    pub async fn post_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, LedgerError> {
        let chart = self.chart(entry.business_id).await?;
        self.write(&chart, entry).await
    }

    async fn write(
        &self,
        chart: &ChartOfAccounts,
        new_entry: NewJournalEntry,
    ) -> Result<JournalEntry, LedgerError> {
        let builder = JournalEntryBuilder::new(chart, &self.cash_account_name);
        let entry = builder.finalize(new_entry, Utc::now())?;
        match (self.store.insert_entry(&entry).await, entry.reverses_entry_id) {
            (Ok(()), _) => Ok(entry),
            // another reversal of the same original won the race
            (Err(StoreError::Conflict(_)), Some(original)) => {
                Err(LedgerError::AlreadyVoided(original))
            }
            (Err(err), _) => Err(err.into()),
        }
    }

    /// Voids a posted entry, dated now.
    ///
    /// # Errors
    ///
    /// See [`Self::void_at`].
    pub async fn void(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
    ) -> Result<VoidOutcome, LedgerError> {
        self.void_at(business_id, entry_id, Utc::now()).await
    }

    /// Voids a posted entry by posting its reversal, then flagging it void.
    ///
    /// If an earlier void committed the reversal but never flagged the
    /// original, the flip is completed against that reversal instead of
    /// writing a second one.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` if the entry does not exist in this business
    /// - `AlreadyVoided` if it is void, or another void won a race for it
    /// - `CannotVoidReversal` if the entry is itself a reversal
    /// - `Persistence` if the reversal could not be written (original stays
    ///   posted)
    /// - `VoidInconsistent` if the reversal exists but the original could not
    ///   be flagged void; retrying the void completes it
    pub async fn void_at(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
        voided_at: DateTime<Utc>,
    ) -> Result<VoidOutcome, LedgerError> {
        let original = self
            .store
            .find_entry(business_id, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        let reversing = ReversalService::reversing_entry(&original, voided_at.date_naive())?;
        let reversal = match self.store.find_reversal(business_id, entry_id).await? {
            Some(existing) => {
                warn!(
                    %business_id,
                    original = %entry_id,
                    reversal = %existing.id,
                    "completing interrupted void"
                );
                existing
            }
            None => {
                let chart = self.chart(business_id).await?;
                self.write(&chart, reversing).await?
            }
        };

        match self
            .store
            .mark_void(business_id, entry_id, reversal.id)
            .await
        {
            Ok(()) => {}
            // another caller finished the same flip
            Err(StoreError::Conflict(_)) => return Err(LedgerError::AlreadyVoided(entry_id)),
            Err(source) => {
                error!(
                    %business_id,
                    original = %entry_id,
                    reversal = %reversal.id,
                    error = %source,
                    "reversal committed but original could not be marked void; manual reconciliation required"
                );
                return Err(LedgerError::VoidInconsistent {
                    original: entry_id,
                    reversal: reversal.id,
                    source,
                });
            }
        }

        info!(%business_id, original = %entry_id, reversal = %reversal.id, "voided journal entry");

        let mut original = original;
        original.status = EntryStatus::Void {
            reversal_entry_id: reversal.id,
        };
        Ok(VoidOutcome { original, reversal })
    }

    /// Loads one entry annotated for display.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry does not exist in this business.
    pub async fn entry(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
    ) -> Result<EntryView, LedgerError> {
        let entry = self
            .store
            .find_entry(business_id, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let chart = self.chart(business_id).await?;
        annotate(&chart, entry)
    }

    /// Lists entries, void ones included unless filtered out.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn list(
        &self,
        business_id: BusinessId,
        filter: &EntryFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<EntryView>, LedgerError> {
        let chart = self.chart(business_id).await?;
        let entries = self.store.list_entries(business_id, filter).await?;
        let views = entries
            .into_iter()
            .map(|e| annotate(&chart, e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse::paginate(views, page))
    }

    /// Balance of one account, or the cash position when `account_id` is
    /// `None`. Void entries never count.
    ///
    /// # Errors
    ///
    /// Returns `AccountIdNotFound` / `AccountNotFound` if the account (or the
    /// cash account) is missing.
    pub async fn balance(
        &self,
        business_id: BusinessId,
        account_id: Option<AccountId>,
    ) -> Result<Decimal, LedgerError> {
        let chart = self.chart(business_id).await?;
        let entries = self
            .store
            .list_entries(business_id, &EntryFilter::default())
            .await?;
        match account_id {
            Some(id) => BalanceCalculator::account_balance(&chart, &entries, id),
            None => BalanceCalculator::cash_position(&chart, &entries, &self.cash_account_name),
        }
    }

    /// Totals and balance of every account.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn account_balances(
        &self,
        business_id: BusinessId,
    ) -> Result<Vec<AccountBalance>, LedgerError> {
        let chart = self.chart(business_id).await?;
        let entries = self
            .store
            .list_entries(business_id, &EntryFilter::default())
            .await?;
        Ok(BalanceCalculator::account_balances(&chart, &entries))
    }

    /// Trial balance over posted entries.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn trial_balance(&self, business_id: BusinessId) -> Result<TrialBalance, LedgerError> {
        let chart = self.chart(business_id).await?;
        let entries = self
            .store
            .list_entries(business_id, &EntryFilter::default())
            .await?;
        Ok(BalanceCalculator::trial_balance(&chart, &entries))
    }
}

/// Annotates an entry's lines with account names and types.
fn annotate(chart: &ChartOfAccounts, entry: JournalEntry) -> Result<EntryView, LedgerError> {
    let totals = EntryTotals::of(&entry.lines);
    let lines = entry
        .lines
        .into_iter()
        .map(|l| {
            let account = chart.get(l.account_id)?;
            Ok(LineView {
                id: l.id,
                account_id: l.account_id,
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                account_type: account.account_type,
                side: l.side,
                amount: l.amount,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;

    Ok(EntryView {
        id: entry.id,
        transaction_date: entry.transaction_date,
        description: entry.description,
        status: entry.status,
        reverses_entry_id: entry.reverses_entry_id,
        created_at: entry.created_at,
        lines,
        total_debit: totals.debit,
        total_credit: totals.credit,
    })
}
