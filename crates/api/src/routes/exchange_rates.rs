//! Exchange rate routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::currency::ExchangeRate;
use tally_core::ledger::LedgerError;
use tally_db::ExchangeRateRepository;
use tally_shared::AppError;
use tally_shared::types::{BusinessId, CurrencyCode};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the exchange rate routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/businesses/{business_id}/exchange-rates",
        get(list_exchange_rates).post(upsert_exchange_rate),
    )
}

/// Request body for creating or replacing a rate.
#[derive(Debug, Deserialize)]
pub struct UpsertExchangeRateRequest {
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// 1 `from_currency` = `rate` `to_currency`.
    pub rate: Decimal,
    /// Date the rate takes effect.
    pub effective_date: NaiveDate,
}

fn parse_code(code: &str) -> Result<CurrencyCode, ApiError> {
    CurrencyCode::parse(code).map_err(|e| AppError::Validation(e.to_string()).into())
}

/// GET /businesses/{business_id}/exchange-rates - List stored rates.
async fn list_exchange_rates(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<ExchangeRate>>, ApiError> {
    state.business(business_id).await?;
    let rates = ExchangeRateRepository::new((*state.db).clone())
        .list(business_id)
        .await?;
    Ok(Json(rates))
}

/// POST /businesses/{business_id}/exchange-rates - Create or replace a rate.
async fn upsert_exchange_rate(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Json(payload): Json<UpsertExchangeRateRequest>,
) -> Result<(StatusCode, Json<ExchangeRate>), ApiError> {
    let rate = ExchangeRate::new(
        parse_code(&payload.from_currency)?,
        parse_code(&payload.to_currency)?,
        payload.rate,
        payload.effective_date,
    )
    .map_err(LedgerError::from)?;

    state.business(business_id).await?;
    let stored = ExchangeRateRepository::new((*state.db).clone())
        .upsert(business_id, &rate)
        .await?;

    info!(
        %business_id,
        from = %stored.from_currency,
        to = %stored.to_currency,
        rate = %stored.rate,
        effective_date = %stored.effective_date,
        "exchange rate stored"
    );
    Ok((StatusCode::CREATED, Json(stored)))
}
