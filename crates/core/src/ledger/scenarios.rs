//! End-to-end engine tests over the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{BusinessId, CategoryId, CurrencyCode, JournalEntryId, PageRequest};

use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::service::LedgerService;
use super::store::{LedgerStore, StoreError};
use super::types::{Business, EntryFilter, JournalEntry, Side, TransactionEvent};
use crate::chart::{Account, Category, CategoryKind};
use crate::currency::{ExchangeRate, RateTable};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn eur() -> CurrencyCode {
    CurrencyCode::parse("EUR").unwrap()
}

fn business() -> Business {
    Business {
        id: BusinessId::new(),
        name: "Corner Bakery".to_string(),
        base_currency: CurrencyCode::usd(),
    }
}

fn rates() -> RateTable {
    [ExchangeRate::new(eur(), CurrencyCode::usd(), dec!(1.1), date()).unwrap()]
        .into_iter()
        .collect()
}

fn event(amount: Decimal, currency: CurrencyCode, description: &str) -> TransactionEvent {
    TransactionEvent {
        date: date(),
        amount,
        currency,
        description: description.to_string(),
    }
}

/// Store wrapper whose status flip or entry insert can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryLedgerStore,
    fail_mark_void: AtomicBool,
    fail_insert_entry: AtomicBool,
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn accounts(&self, business_id: BusinessId) -> Result<Vec<Account>, StoreError> {
        self.inner.accounts(business_id).await
    }

    async fn insert_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        self.inner.insert_accounts(accounts).await
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        if self.fail_insert_entry.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.insert_entry(entry).await
    }

    async fn find_entry(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError> {
        self.inner.find_entry(business_id, entry_id).await
    }

    async fn find_reversal(
        &self,
        business_id: BusinessId,
        original_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError> {
        self.inner.find_reversal(business_id, original_id).await
    }

    async fn list_entries(
        &self,
        business_id: BusinessId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        self.inner.list_entries(business_id, filter).await
    }

    async fn mark_void(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
        reversal_entry_id: JournalEntryId,
    ) -> Result<(), StoreError> {
        if self.fail_mark_void.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner
            .mark_void(business_id, entry_id, reversal_entry_id)
            .await
    }
}

struct Fixture<S: LedgerStore> {
    store: Arc<S>,
    service: LedgerService<S, RateTable>,
    business: Business,
}

impl<S: LedgerStore> Fixture<S> {
    async fn new(store: S) -> Self {
        let store = Arc::new(store);
        let service = LedgerService::new(Arc::clone(&store), Arc::new(rates()));
        let business = business();
        service.seed_default_chart(business.id).await.unwrap();
        Self {
            store,
            service,
            business,
        }
    }

    async fn category(&self, name: &str, kind: CategoryKind) -> Category {
        self.service
            .bind_category(self.business.id, CategoryId::new(), name, kind)
            .await
            .unwrap()
    }

    async fn post_sales(&self, amount: Decimal) -> JournalEntry {
        let sales = self.category("Sales", CategoryKind::Income).await;
        self.service
            .post(
                &self.business,
                &sales,
                &event(amount, CurrencyCode::usd(), "Bread order"),
            )
            .await
            .unwrap()
    }

    async fn account_name(&self, line_account: tally_shared::types::AccountId) -> String {
        let chart = self.service.chart(self.business.id).await.unwrap();
        chart.get(line_account).unwrap().name.clone()
    }

    async fn cash(&self) -> Decimal {
        self.service.balance(self.business.id, None).await.unwrap()
    }
}

#[tokio::test]
async fn scenario_a_income_in_base_currency() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let entry = fx.post_sales(dec!(100)).await;

    assert_eq!(entry.lines.len(), 2);
    let debit = &entry.lines[0];
    let credit = &entry.lines[1];
    assert_eq!(debit.side, Side::Debit);
    assert_eq!(fx.account_name(debit.account_id).await, "Cash");
    assert_eq!(debit.amount, dec!(100));
    assert_eq!(credit.side, Side::Credit);
    assert_eq!(fx.account_name(credit.account_id).await, "Sales");
    assert_eq!(credit.amount, dec!(100));

    assert_eq!(fx.cash().await, dec!(100));
}

#[tokio::test]
async fn scenario_b_foreign_currency_expense() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let supplies = fx.category("Office Supplies", CategoryKind::Expense).await;

    let entry = fx
        .service
        .post(&fx.business, &supplies, &event(dec!(50), eur(), "Printer paper"))
        .await
        .unwrap();

    assert_eq!(entry.lines[0].side, Side::Debit);
    assert_eq!(fx.account_name(entry.lines[0].account_id).await, "Office Supplies");
    assert_eq!(entry.lines[0].amount, dec!(55));
    assert_eq!(entry.lines[1].side, Side::Credit);
    assert_eq!(fx.account_name(entry.lines[1].account_id).await, "Cash");
    assert_eq!(entry.lines[1].amount, dec!(55));
    assert_eq!(fx.cash().await, dec!(-55));
}

#[tokio::test]
async fn scenario_c_void_restores_balance() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let entry = fx.post_sales(dec!(100)).await;

    let outcome = fx.service.void(fx.business.id, entry.id).await.unwrap();

    let reversal = &outcome.reversal;
    assert_eq!(reversal.reverses_entry_id, Some(entry.id));
    assert_eq!(reversal.description, "Reversal of: Bread order");
    assert_eq!(reversal.lines[0].side, Side::Credit);
    assert_eq!(fx.account_name(reversal.lines[0].account_id).await, "Cash");
    assert_eq!(reversal.lines[1].side, Side::Debit);
    assert_eq!(fx.account_name(reversal.lines[1].account_id).await, "Sales");
    assert_eq!(
        outcome.original.status.reversal_entry_id(),
        Some(reversal.id)
    );

    assert_eq!(fx.cash().await, Decimal::ZERO);
    let sales = fx.category("Sales", CategoryKind::Income).await;
    assert_eq!(
        fx.service
            .balance(fx.business.id, Some(sales.account_id))
            .await
            .unwrap(),
        Decimal::ZERO
    );

    // the original stays listed, flagged void
    let listed = fx
        .service
        .list(fx.business.id, &EntryFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 2);
    let original = listed.data.iter().find(|e| e.id == entry.id).unwrap();
    assert!(original.status.is_void());
    assert_eq!(original.lines[0].account_name, "Cash");
}

#[tokio::test]
async fn scenario_d_unmatched_category_writes_nothing() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;

    let bind = fx
        .service
        .bind_category(fx.business.id, CategoryId::new(), "Crypto Gains", CategoryKind::Income)
        .await;
    assert!(matches!(bind, Err(LedgerError::AccountNotFound(name)) if name == "Crypto Gains"));

    // a category bound to an account outside the chart fails the same way at post time
    let stray = Category {
        id: CategoryId::new(),
        business_id: fx.business.id,
        name: "Crypto Gains".to_string(),
        kind: CategoryKind::Income,
        account_id: tally_shared::types::AccountId::new(),
    };
    let result = fx
        .service
        .post(&fx.business, &stray, &event(dec!(10), CurrencyCode::usd(), "coins"))
        .await;
    assert!(matches!(result, Err(LedgerError::AccountIdNotFound(_))));

    assert_eq!(fx.store.entry_count().await, 0);
    assert_eq!(fx.store.line_count().await, 0);
}

#[tokio::test]
async fn scenario_e_double_void_is_a_conflict() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let entry = fx.post_sales(dec!(100)).await;

    fx.service.void(fx.business.id, entry.id).await.unwrap();
    let entries_after_first = fx.store.entry_count().await;
    let lines_after_first = fx.store.line_count().await;

    let second = fx.service.void(fx.business.id, entry.id).await;
    assert!(matches!(second, Err(LedgerError::AlreadyVoided(id)) if id == entry.id));
    assert_eq!(second.unwrap_err().http_status_code(), 409);
    assert_eq!(fx.store.entry_count().await, entries_after_first);
    assert_eq!(fx.store.line_count().await, lines_after_first);
}

#[tokio::test]
async fn missing_rate_aborts_posting() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let supplies = fx.category("Office Supplies", CategoryKind::Expense).await;
    let gbp = CurrencyCode::parse("GBP").unwrap();

    let result = fx
        .service
        .post(&fx.business, &supplies, &event(dec!(20), gbp, "Tea"))
        .await;
    assert!(matches!(result, Err(LedgerError::RateUnavailable { .. })));
    assert_eq!(fx.store.entry_count().await, 0);
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let sales = fx.category("Sales", CategoryKind::Income).await;
    let result = fx
        .service
        .post(&fx.business, &sales, &event(Decimal::ZERO, CurrencyCode::usd(), ""))
        .await;
    assert!(matches!(result, Err(LedgerError::ZeroAmount)));
}

#[tokio::test]
async fn out_of_range_amounts_are_rejected_before_any_write() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let supplies = fx.category("Office Supplies", CategoryKind::Expense).await;

    for (amount, currency) in [
        (Decimal::MAX, eur()),
        (dec!(1_000_000_000_000_000), CurrencyCode::usd()),
        // in range before conversion, out of range after
        (dec!(999_999_999_999_999), eur()),
    ] {
        let result = fx
            .service
            .post(&fx.business, &supplies, &event(amount, currency.clone(), "Too much"))
            .await;
        assert!(
            matches!(result, Err(LedgerError::AmountOutOfRange(_))),
            "{amount} {currency}: {result:?}"
        );
    }
    assert_eq!(fx.store.entry_count().await, 0);
}

#[tokio::test]
async fn amount_rounding_to_zero_is_rejected() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let supplies = fx.category("Office Supplies", CategoryKind::Expense).await;
    let result = fx
        .service
        .post(&fx.business, &supplies, &event(dec!(0.00001), eur(), "Dust"))
        .await;
    assert!(matches!(result, Err(LedgerError::ZeroAmount)));
    assert_eq!(fx.store.entry_count().await, 0);
}

#[tokio::test]
async fn category_from_another_business_is_rejected() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let mut sales = fx.category("Sales", CategoryKind::Income).await;
    sales.business_id = BusinessId::new();
    let result = fx
        .service
        .post(&fx.business, &sales, &event(dec!(1), CurrencyCode::usd(), ""))
        .await;
    assert!(matches!(result, Err(LedgerError::CategoryNotFound(_))));
}

#[tokio::test]
async fn void_of_unknown_entry_is_not_found() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let result = fx.service.void(fx.business.id, JournalEntryId::new()).await;
    assert!(matches!(result, Err(LedgerError::EntryNotFound(_))));
}

#[tokio::test]
async fn failed_reversal_write_leaves_original_posted() {
    let fx = Fixture::new(FlakyStore::default()).await;
    let entry = fx.post_sales(dec!(100)).await;

    fx.store.fail_insert_entry.store(true, Ordering::SeqCst);
    let result = fx.service.void(fx.business.id, entry.id).await;
    assert!(matches!(result, Err(LedgerError::Persistence(_))));

    let stored = fx
        .store
        .find_entry(fx.business.id, entry.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.status.is_posted());
    assert_eq!(fx.store.inner.entry_count().await, 1);
    assert_eq!(fx.cash().await, dec!(100));
}

#[tokio::test]
async fn failed_status_flip_is_reported_as_critical() {
    let fx = Fixture::new(FlakyStore::default()).await;
    let entry = fx.post_sales(dec!(100)).await;

    fx.store.fail_mark_void.store(true, Ordering::SeqCst);
    let err = fx
        .service
        .void(fx.business.id, entry.id)
        .await
        .unwrap_err();

    assert!(err.is_critical());
    let LedgerError::VoidInconsistent {
        original, reversal, ..
    } = err
    else {
        panic!("expected VoidInconsistent");
    };
    assert_eq!(original, entry.id);

    // the reversal is committed and the original is still posted; the pair nets out
    let committed = fx
        .store
        .find_entry(fx.business.id, reversal)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(committed.reverses_entry_id, Some(entry.id));
    assert_eq!(fx.cash().await, Decimal::ZERO);

    // a retry that still cannot flip reports the same reversal
    let err = fx
        .service
        .void(fx.business.id, entry.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::VoidInconsistent { reversal: again, .. } if again == reversal
    ));
    assert_eq!(fx.store.inner.entry_count().await, 2);

    // once the store recovers, the retry finishes the flip without a second reversal
    fx.store.fail_mark_void.store(false, Ordering::SeqCst);
    let outcome = fx.service.void(fx.business.id, entry.id).await.unwrap();
    assert_eq!(outcome.reversal.id, reversal);
    assert_eq!(outcome.original.status.reversal_entry_id(), Some(reversal));
    assert_eq!(fx.store.inner.entry_count().await, 2);

    let stored = fx
        .store
        .find_entry(fx.business.id, entry.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.status.is_void());
    assert_eq!(fx.cash().await, Decimal::ZERO);

    let again = fx.service.void(fx.business.id, entry.id).await;
    assert!(matches!(again, Err(LedgerError::AlreadyVoided(_))));
}

#[tokio::test]
async fn concurrent_voids_produce_one_reversal() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let entry = fx.post_sales(dec!(100)).await;

    let (a, b) = tokio::join!(
        fx.service.void(fx.business.id, entry.id),
        fx.service.void(fx.business.id, entry.id)
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(LedgerError::AlreadyVoided(_))))
    );
    assert_eq!(fx.store.entry_count().await, 2);
    assert_eq!(fx.cash().await, Decimal::ZERO);
}

#[tokio::test]
async fn reversal_cannot_be_voided() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let entry = fx.post_sales(dec!(100)).await;
    let outcome = fx.service.void(fx.business.id, entry.id).await.unwrap();

    let result = fx.service.void(fx.business.id, outcome.reversal.id).await;
    assert!(matches!(result, Err(LedgerError::CannotVoidReversal(_))));
}

#[tokio::test]
async fn trial_balance_and_account_balances() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    fx.post_sales(dec!(250)).await;
    let rent = fx.category("Rent", CategoryKind::Expense).await;
    fx.service
        .post(&fx.business, &rent, &event(dec!(80), CurrencyCode::usd(), "March rent"))
        .await
        .unwrap();
    let voided = fx.post_sales(dec!(999)).await;
    fx.service.void(fx.business.id, voided.id).await.unwrap();

    let trial = fx.service.trial_balance(fx.business.id).await.unwrap();
    assert!(trial.is_balanced);
    assert_eq!(trial.total_debit, dec!(330));
    assert_eq!(trial.total_credit, dec!(330));

    let balances = fx.service.account_balances(fx.business.id).await.unwrap();
    let by_name = |name: &str| balances.iter().find(|b| b.name == name).unwrap().balance;
    assert_eq!(by_name("Cash"), dec!(170));
    assert_eq!(by_name("Sales"), dec!(250));
    assert_eq!(by_name("Rent"), dec!(80));
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    for amount in [dec!(1), dec!(2), dec!(3)] {
        fx.post_sales(amount).await;
    }
    let first = fx.post_sales(dec!(4)).await;
    fx.service.void(fx.business.id, first.id).await.unwrap();

    let void_only = EntryFilter {
        void: Some(true),
        ..EntryFilter::default()
    };
    let page = fx
        .service
        .list(fx.business.id, &void_only, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0].id, first.id);
    assert_eq!(page.data[0].total_debit, dec!(4));
    assert_eq!(page.data[0].total_credit, dec!(4));

    let small = PageRequest {
        page: 2,
        per_page: 2,
    };
    let page = fx
        .service
        .list(fx.business.id, &EntryFilter::default(), &small)
        .await
        .unwrap();
    assert_eq!(page.meta.total, 5);
    assert_eq!(page.meta.total_pages, 3);
    assert_eq!(page.data.len(), 2);
}

#[tokio::test]
async fn seeding_is_idempotent_and_custom_accounts_are_unique() {
    let fx = Fixture::new(InMemoryLedgerStore::new()).await;
    let before = fx.service.chart(fx.business.id).await.unwrap().accounts().len();
    fx.service.seed_default_chart(fx.business.id).await.unwrap();
    let after = fx.service.chart(fx.business.id).await.unwrap().accounts().len();
    assert_eq!(before, after);

    let parking = crate::chart::NewAccount {
        name: "Parking".to_string(),
        code: "5550".to_string(),
        account_type: crate::chart::AccountType::Expense,
    };
    fx.service
        .add_account(fx.business.id, parking.clone())
        .await
        .unwrap();
    assert!(matches!(
        fx.service.add_account(fx.business.id, parking).await,
        Err(LedgerError::DuplicateAccount(_))
    ));
}
