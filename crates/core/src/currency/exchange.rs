//! Exchange rate types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::CurrencyCode;

use super::provider::RateError;

/// Exchange rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Exchange rate (1 from_currency = rate to_currency).
    pub rate: Decimal,
    /// Date this rate is effective.
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    /// Creates a validated exchange rate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` unless `rate > 0`, and `SameCurrency` if both
    /// currencies are equal.
    pub fn new(
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> Result<Self, RateError> {
        if rate <= Decimal::ZERO {
            return Err(RateError::InvalidRate);
        }
        if from_currency == to_currency {
            return Err(RateError::SameCurrency(from_currency));
        }
        Ok(Self {
            from_currency,
            to_currency,
            rate,
            effective_date,
        })
    }

    /// Returns the inverse rate, or `None` if the rate is zero.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(Self {
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            rate,
            effective_date: self.effective_date,
        })
    }
}
