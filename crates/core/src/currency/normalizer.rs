//! Normalizes transaction amounts into a business's base currency.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::CurrencyCode;
use tracing::debug;

use super::conversion::{convert_amount, is_storable, round_amount};
use super::provider::{RateError, RateProvider};

/// An amount expressed in the base currency, with the rate that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalized {
    /// The amount the ledger posts.
    pub base_amount: Decimal,
    /// Rate applied (1 for same-currency amounts).
    pub rate: Decimal,
}

/// Converts amounts through a [`RateProvider`].
pub struct CurrencyNormalizer<'a, R: RateProvider + ?Sized> {
    rates: &'a R,
}

impl<'a, R: RateProvider + ?Sized> CurrencyNormalizer<'a, R> {
    /// Creates a normalizer over `rates`.
    #[must_use]
    pub const fn new(rates: &'a R) -> Self {
        Self { rates }
    }

    /// Converts `amount` from `source` into `target` as of `as_of`.
    ///
    /// Same-currency amounts are only rounded to the ledger scale, without
    /// consulting the provider.
    ///
    /// # Errors
    ///
    /// Propagates `Unavailable` (and any provider failure) so the caller
    /// aborts instead of posting an unconverted amount. Returns `Overflow` if
    /// the result does not fit in a ledger amount.
    pub async fn normalize(
        &self,
        amount: Decimal,
        source: &CurrencyCode,
        target: &CurrencyCode,
        as_of: NaiveDate,
    ) -> Result<Normalized, RateError> {
        let overflow = || RateError::Overflow {
            amount,
            from: source.clone(),
        };

        if source == target {
            let base_amount = round_amount(amount);
            if !is_storable(base_amount) {
                return Err(overflow());
            }
            return Ok(Normalized {
                base_amount,
                rate: Decimal::ONE,
            });
        }

        let rate = self.rates.rate(source, target, as_of).await?;
        if rate <= Decimal::ZERO {
            return Err(RateError::InvalidRate);
        }

        let base_amount = convert_amount(amount, rate)
            .filter(|converted| is_storable(*converted))
            .ok_or_else(overflow)?;
        debug!(%source, %target, %as_of, %rate, %amount, %base_amount, "normalized amount");
        Ok(Normalized { base_amount, rate })
    }
}
