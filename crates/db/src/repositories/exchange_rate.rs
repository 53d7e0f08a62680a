//! Exchange rate repository for currency conversion database operations.
//!
//! Rates are stored per business. Lookup takes the most recent rate on or
//! before the requested date, trying the direct pair first and then the
//! inverse pair.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::currency::{ExchangeRate, RateError, RateProvider};
use tally_shared::types::{BusinessId, CurrencyCode};
use tracing::debug;
use uuid::Uuid;

use crate::entities::exchange_rates;

/// Error types for exchange rate operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateError {
    /// A stored currency code is malformed.
    #[error("Invalid stored currency code '{0}'")]
    InvalidCurrency(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Exchange rate repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates or updates the rate for a pair and effective date.
    ///
    /// `rate` is validated on construction, so only positive rates between
    /// distinct currencies reach the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn upsert(
        &self,
        business_id: BusinessId,
        rate: &ExchangeRate,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        let existing = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::BusinessId.eq(business_id.into_inner()))
            .filter(exchange_rates::Column::FromCurrency.eq(rate.from_currency.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(rate.to_currency.as_str()))
            .filter(exchange_rates::Column::EffectiveDate.eq(rate.effective_date))
            .one(&self.db)
            .await?;

        let now = Utc::now().fixed_offset();

        let model = if let Some(existing_rate) = existing {
            let mut active: exchange_rates::ActiveModel = existing_rate.into();
            active.rate = Set(rate.rate);
            active.updated_at = Set(now);
            active.update(&self.db).await?
        } else {
            exchange_rates::ActiveModel {
                id: Set(Uuid::now_v7()),
                business_id: Set(business_id.into_inner()),
                from_currency: Set(rate.from_currency.to_string()),
                to_currency: Set(rate.to_currency.to_string()),
                rate: Set(rate.rate),
                effective_date: Set(rate.effective_date),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await?
        };

        to_rate(model)
    }

    /// Lists a business's rates, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, business_id: BusinessId) -> Result<Vec<ExchangeRate>, ExchangeRateError> {
        exchange_rates::Entity::find()
            .filter(exchange_rates::Column::BusinessId.eq(business_id.into_inner()))
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .order_by_asc(exchange_rates::Column::FromCurrency)
            .order_by_asc(exchange_rates::Column::ToCurrency)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_rate)
            .collect()
    }

    /// Finds the rate for a pair on or before `date`.
    ///
    /// Returns `None` when neither the pair nor its inverse has a rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_rate(
        &self,
        business_id: BusinessId,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, ExchangeRateError> {
        if from == to {
            return Ok(Some(Decimal::ONE));
        }

        if let Some(direct) = self.find_direct_rate(business_id, from, to, date).await? {
            return Ok(Some(direct.rate));
        }

        // USD/EUR = 0.85 gives EUR/USD = 1/0.85
        let inverse = self.find_direct_rate(business_id, to, from, date).await?;
        Ok(inverse.and_then(|r| Decimal::ONE.checked_div(r.rate)))
    }

    /// Finds a direct exchange rate (most recent on or before date).
    async fn find_direct_rate(
        &self,
        business_id: BusinessId,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Option<exchange_rates::Model>, ExchangeRateError> {
        let rate = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::BusinessId.eq(business_id.into_inner()))
            .filter(exchange_rates::Column::FromCurrency.eq(from.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(to.as_str()))
            .filter(exchange_rates::Column::EffectiveDate.lte(date))
            .order_by_desc(exchange_rates::Column::EffectiveDate)
            .one(&self.db)
            .await?;

        Ok(rate)
    }
}

fn to_rate(model: exchange_rates::Model) -> Result<ExchangeRate, ExchangeRateError> {
    let parse = |code: String| {
        CurrencyCode::parse(&code).map_err(|_| ExchangeRateError::InvalidCurrency(code))
    };
    Ok(ExchangeRate {
        from_currency: parse(model.from_currency)?,
        to_currency: parse(model.to_currency)?,
        rate: model.rate,
        effective_date: model.effective_date,
    })
}

/// A business's stored rates, seen through the engine's [`RateProvider`].
#[derive(Debug, Clone)]
pub struct BusinessRates {
    repo: ExchangeRateRepository,
    business_id: BusinessId,
}

impl BusinessRates {
    /// Scopes `repo` to one business.
    #[must_use]
    pub const fn new(repo: ExchangeRateRepository, business_id: BusinessId) -> Self {
        Self { repo, business_id }
    }
}

#[async_trait]
impl RateProvider for BusinessRates {
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        let found = self
            .repo
            .find_rate(self.business_id, from, to, date)
            .await
            .map_err(|e| RateError::Source(e.to_string()))?;

        debug!(business_id = %self.business_id, %from, %to, %date, found = found.is_some(), "rate lookup");
        found.ok_or_else(|| RateError::Unavailable {
            from: from.clone(),
            to: to.clone(),
            date,
        })
    }
}
