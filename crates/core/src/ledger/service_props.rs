//! Property-based tests for the ledger engine.
//!
//! - Balance integrity of every entry the builder produces
//! - Order independence of balances
//! - Reversal round-trip through the service

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BusinessId, CategoryId, CurrencyCode};

use super::balance::BalanceCalculator;
use super::builder::JournalEntryBuilder;
use super::memory::InMemoryLedgerStore;
use super::service::LedgerService;
use super::types::{Business, JournalEntry, TransactionEvent};
use super::validation::EntryTotals;
use crate::chart::{CategoryKind, ChartOfAccounts, DEFAULT_CASH_ACCOUNT, default_accounts};
use crate::currency::RateTable;

/// Amounts from 0.01 to 10,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// (category name, kind, amount) events drawn from the default chart.
fn event_strategy() -> impl Strategy<Value = (&'static str, CategoryKind, Decimal)> {
    (
        prop_oneof![
            Just(("Sales", CategoryKind::Income)),
            Just(("Service Revenue", CategoryKind::Income)),
            Just(("Rent", CategoryKind::Expense)),
            Just(("Office Supplies", CategoryKind::Expense)),
            Just(("Travel", CategoryKind::Expense)),
        ],
        positive_amount(),
    )
        .prop_map(|((name, kind), amount)| (name, kind, amount))
}

fn chart() -> ChartOfAccounts {
    let business_id = BusinessId::new();
    ChartOfAccounts::new(business_id, default_accounts(business_id))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
}

fn build_entries(
    chart: &ChartOfAccounts,
    events: &[(&'static str, CategoryKind, Decimal)],
) -> Vec<JournalEntry> {
    let builder = JournalEntryBuilder::new(chart, DEFAULT_CASH_ACCOUNT);
    events
        .iter()
        .map(|(name, kind, amount)| {
            let category = chart.bind_category(CategoryId::new(), name, *kind).unwrap();
            let new_entry = builder.categorized(&category, date(), name, *amount).unwrap();
            builder.finalize(new_entry, Utc::now()).unwrap()
        })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every built entry has debits equal to credits.
    #[test]
    fn prop_built_entries_are_balanced(
        events in prop::collection::vec(event_strategy(), 1..20),
    ) {
        let chart = chart();
        for entry in build_entries(&chart, &events) {
            prop_assert!(EntryTotals::of(&entry.lines).is_balanced());
            prop_assert!(entry.lines.len() >= 2);
        }
    }

    /// The cash position is the same for any ordering of the entries.
    #[test]
    fn prop_cash_position_is_order_independent(
        (events, shuffled) in prop::collection::vec(event_strategy(), 1..20)
            .prop_flat_map(|events| {
                let indices: Vec<usize> = (0..events.len()).collect();
                (Just(events), Just(indices).prop_shuffle())
            }),
    ) {
        let chart = chart();
        let entries = build_entries(&chart, &events);
        let permuted: Vec<JournalEntry> = shuffled.iter().map(|&i| entries[i].clone()).collect();

        let a = BalanceCalculator::cash_position(&chart, &entries, DEFAULT_CASH_ACCOUNT).unwrap();
        let b = BalanceCalculator::cash_position(&chart, &permuted, DEFAULT_CASH_ACCOUNT).unwrap();
        prop_assert_eq!(a, b);

        let expected: Decimal = events
            .iter()
            .map(|(_, kind, amount)| match kind {
                CategoryKind::Income => *amount,
                CategoryKind::Expense => -*amount,
            })
            .sum();
        prop_assert_eq!(a, expected);
    }

    /// Posting then voiding an entry restores every balance.
    #[test]
    fn prop_post_then_void_restores_balances(
        prior in prop::collection::vec(event_strategy(), 0..8),
        (name, kind, amount) in event_strategy(),
    ) {
        runtime().block_on(async {
            let store = Arc::new(InMemoryLedgerStore::new());
            let service = LedgerService::new(store, Arc::new(RateTable::new()));
            let business = Business {
                id: BusinessId::new(),
                name: "Prop Co".to_string(),
                base_currency: CurrencyCode::usd(),
            };
            service.seed_default_chart(business.id).await.unwrap();

            let post = |name: &'static str, kind, amount| {
                let service = service.clone();
                let business = business.clone();
                async move {
                    let category = service
                        .bind_category(business.id, CategoryId::new(), name, kind)
                        .await
                        .unwrap();
                    let event = TransactionEvent {
                        date: date(),
                        amount,
                        currency: CurrencyCode::usd(),
                        description: name.to_string(),
                    };
                    service.post(&business, &category, &event).await.unwrap()
                }
            };

            for (name, kind, amount) in prior {
                post(name, kind, amount).await;
            }
            let before = service.account_balances(business.id).await.unwrap();
            let cash_before = service.balance(business.id, None).await.unwrap();

            let entry = post(name, kind, amount).await;
            service.void(business.id, entry.id).await.unwrap();

            let after = service.account_balances(business.id).await.unwrap();
            let cash_after = service.balance(business.id, None).await.unwrap();
            prop_assert_eq!(cash_before, cash_after);
            for (b, a) in before.iter().zip(&after) {
                prop_assert_eq!(b.balance, a.balance, "account {}", b.name);
            }
            Ok(())
        })?;
    }
}
