//! Exchange rate lookup contract.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::CurrencyCode;
use thiserror::Error;

use super::exchange::ExchangeRate;

/// Errors from rate lookup and rate validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateError {
    /// No rate for the pair on or before the date.
    #[error("No exchange rate found for {from} to {to} on {date}")]
    Unavailable {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
        /// As-of date.
        date: NaiveDate,
    },

    /// Rates must be positive.
    #[error("Exchange rate must be positive")]
    InvalidRate,

    /// Source and target are the same currency.
    #[error("Source and target currencies must differ, got {0} for both")]
    SameCurrency(CurrencyCode),

    /// The converted amount does not fit in a ledger amount.
    #[error("Converting {amount} {from} exceeds the ledger amount range")]
    Overflow {
        /// Amount before conversion.
        amount: Decimal,
        /// Source currency.
        from: CurrencyCode,
    },

    /// The collaborator failed.
    #[error("{0}")]
    Source(String),
}

/// Point-in-time exchange rate lookup.
///
/// Returns how many units of `to` one unit of `from` was worth on `date`.
/// Implementations make a single attempt; retry policy belongs to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Looks up the rate for the pair as of `date`.
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Decimal, RateError>;
}

/// A fixed table of rates.
///
/// Uses the most recent rate effective on or before the requested date. The
/// direct pair wins; otherwise the inverse pair is used as `1 / rate`.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: Vec<ExchangeRate>,
}

impl RateTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rate.
    pub fn insert(&mut self, rate: ExchangeRate) {
        self.rates.push(rate);
    }

    /// Finds the applicable rate without going through the async trait.
    #[must_use]
    pub fn lookup(&self, from: &CurrencyCode, to: &CurrencyCode, date: NaiveDate) -> Option<Decimal> {
        let latest = |from: &CurrencyCode, to: &CurrencyCode| {
            self.rates
                .iter()
                .filter(|r| {
                    &r.from_currency == from && &r.to_currency == to && r.effective_date <= date
                })
                .max_by_key(|r| r.effective_date)
        };

        if let Some(direct) = latest(from, to) {
            return Some(direct.rate);
        }
        latest(to, from)
            .and_then(ExchangeRate::inverse)
            .map(|r| r.rate)
    }
}

impl FromIterator<ExchangeRate> for RateTable {
    fn from_iter<I: IntoIterator<Item = ExchangeRate>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl RateProvider for RateTable {
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        self.lookup(from, to, date)
            .ok_or_else(|| RateError::Unavailable {
                from: from.clone(),
                to: to.clone(),
                date,
            })
    }
}
