//! Business routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tally_core::chart::Account;
use tally_core::ledger::Business;
use tally_db::BusinessRepository;
use tally_shared::AppError;
use tally_shared::types::{BusinessId, CurrencyCode};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the business routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/businesses", post(create_business))
        .route("/businesses/{business_id}", get(get_business))
}

/// Request body for creating a business.
#[derive(Debug, Deserialize)]
pub struct CreateBusinessRequest {
    /// Display name.
    pub name: String,
    /// Base currency; defaults to the configured one.
    pub base_currency: Option<String>,
}

/// A newly created business with its seeded chart.
#[derive(Debug, Serialize)]
pub struct CreateBusinessResponse {
    /// The business.
    #[serde(flatten)]
    pub business: Business,
    /// Accounts seeded for it (empty when seeding is disabled).
    pub accounts: Vec<Account>,
}

/// POST /businesses - Create a business and seed its chart of accounts.
async fn create_business(
    State(state): State<AppState>,
    Json(payload): Json<CreateBusinessRequest>,
) -> Result<(StatusCode, Json<CreateBusinessResponse>), ApiError> {
    let currency = payload
        .base_currency
        .as_deref()
        .unwrap_or(&state.ledger.default_base_currency);
    let base_currency =
        CurrencyCode::parse(currency).map_err(|e| AppError::Validation(e.to_string()))?;

    let business = BusinessRepository::new((*state.db).clone())
        .create(&payload.name, base_currency)
        .await?;

    let accounts = if state.ledger.seed_default_chart {
        let chart = state
            .ledger_for(business.id)
            .seed_default_chart(business.id)
            .await?;
        chart.accounts().to_vec()
    } else {
        Vec::new()
    };

    info!(
        business_id = %business.id,
        base_currency = %business.base_currency,
        "business created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateBusinessResponse { business, accounts }),
    ))
}

/// GET /businesses/{business_id} - Get one business.
async fn get_business(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Business>, ApiError> {
    Ok(Json(state.business(business_id).await?))
}
