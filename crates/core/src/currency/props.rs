//! Property-based tests for currency conversion and rate lookup.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::CurrencyCode;

use super::conversion::{convert_amount, round_amount};
use super::exchange::ExchangeRate;
use super::provider::RateTable;

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates from 0.0001 to 10000.0000.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Days::new(u64::from(offset))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converted amounts never carry more than 4 decimal places.
    #[test]
    fn prop_convert_rounds_to_4_decimals(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let result = convert_amount(amount, rate).unwrap();
        let scaled = result * Decimal::from(10_000);
        prop_assert_eq!(scaled, scaled.round());
    }

    /// Rounding error is at most half a unit in the last kept place.
    #[test]
    fn prop_convert_error_is_bounded(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let exact = amount * rate;
        let diff = (convert_amount(amount, rate).unwrap() - exact).abs();
        prop_assert!(diff <= Decimal::new(5, 5));
    }

    /// A rate of one leaves the amount unchanged.
    #[test]
    fn prop_unit_rate_preserves_amount(amount in positive_amount()) {
        prop_assert_eq!(convert_amount(amount, Decimal::ONE), Some(round_amount(amount)));
        prop_assert_eq!(convert_amount(amount, Decimal::ONE), Some(amount));
    }

    /// The table returns the latest direct rate effective on or before the date.
    #[test]
    fn prop_table_picks_latest_effective_rate(
        rates in prop::collection::vec((0u32..60, positive_rate()), 1..10),
        query in 0u32..90,
    ) {
        let eur = CurrencyCode::parse("EUR").unwrap();
        let usd = CurrencyCode::usd();
        let table: RateTable = rates
            .iter()
            .map(|(offset, rate)| {
                ExchangeRate::new(eur.clone(), usd.clone(), *rate, day(*offset)).unwrap()
            })
            .collect();

        let found = table.lookup(&eur, &usd, day(query));
        let latest_day = rates.iter().map(|(d, _)| *d).filter(|d| *d <= query).max();
        match latest_day {
            Some(latest_day) => {
                // several rates may share the latest day; any of them is acceptable
                let candidates: Vec<Decimal> = rates
                    .iter()
                    .filter(|(d, _)| *d == latest_day)
                    .map(|(_, r)| *r)
                    .collect();
                prop_assert!(found.is_some_and(|r| candidates.contains(&r)));
            }
            None => prop_assert!(found.is_none()),
        }
    }
}
