//! Chart of accounts and balance routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::chart::{Account, AccountType, NewAccount};
use tally_core::ledger::{AccountBalance, TrialBalance};
use tally_shared::types::{AccountId, BusinessId};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/businesses/{business_id}/accounts",
            get(list_accounts).post(create_account),
        )
        .route(
            "/businesses/{business_id}/accounts/balances",
            get(account_balances),
        )
        .route("/businesses/{business_id}/balance", get(balance))
        .route("/businesses/{business_id}/trial-balance", get(trial_balance))
}

/// Request body for adding a custom account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account code, unique within the business.
    pub code: String,
    /// Account name, unique within the business.
    pub name: String,
    /// One of asset, liability, equity, revenue, expense.
    pub account_type: AccountType,
}

/// Query parameters for the balance endpoint.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Account to report; the cash position when omitted.
    pub account_id: Option<AccountId>,
}

/// Balance of one account, or the business's cash position.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account reported, absent for the cash position.
    pub account_id: Option<AccountId>,
    /// Signed balance in the base currency.
    pub balance: Decimal,
    /// Base currency code.
    pub currency: String,
}

/// GET /businesses/{business_id}/accounts - List the chart of accounts.
async fn list_accounts(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<Account>>, ApiError> {
    state.business(business_id).await?;
    let chart = state.ledger_for(business_id).chart(business_id).await?;
    Ok(Json(chart.accounts().to_vec()))
}

/// POST /businesses/{business_id}/accounts - Add a custom account.
async fn create_account(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    state.business(business_id).await?;
    let account = state
        .ledger_for(business_id)
        .add_account(
            business_id,
            NewAccount {
                name: payload.name,
                code: payload.code,
                account_type: payload.account_type,
            },
        )
        .await?;

    info!(%business_id, account_id = %account.id, code = %account.code, "account created");
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /businesses/{business_id}/accounts/balances - Balance of every account.
async fn account_balances(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<AccountBalance>>, ApiError> {
    state.business(business_id).await?;
    let balances = state
        .ledger_for(business_id)
        .account_balances(business_id)
        .await?;
    Ok(Json(balances))
}

/// GET /businesses/{business_id}/balance - One account's balance or the cash position.
async fn balance(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let business = state.business(business_id).await?;
    let balance = state
        .ledger_for(business_id)
        .balance(business_id, query.account_id)
        .await?;

    Ok(Json(BalanceResponse {
        account_id: query.account_id,
        balance,
        currency: business.base_currency.to_string(),
    }))
}

/// GET /businesses/{business_id}/trial-balance - Trial balance over posted entries.
async fn trial_balance(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<TrialBalance>, ApiError> {
    state.business(business_id).await?;
    let trial = state.ledger_for(business_id).trial_balance(business_id).await?;
    Ok(Json(trial))
}
