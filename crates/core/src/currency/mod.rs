//! Currency normalization and exchange rates.

pub mod conversion;
pub mod exchange;
pub mod normalizer;
pub mod provider;

#[cfg(test)]
mod props;

pub use conversion::{BASE_AMOUNT_SCALE, MAX_AMOUNT, convert_amount, is_storable, round_amount};
pub use exchange::ExchangeRate;
pub use normalizer::{CurrencyNormalizer, Normalized};
pub use provider::{RateError, RateProvider, RateTable};
