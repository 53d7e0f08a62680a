//! Transaction recording routes.
//!
//! A recorded transaction is always kept. Posting it to the ledger may fail
//! (no rate, missing account, storage), in which case the record is stored
//! with `ledger_status = "failed"`, no journal entry exists for it, and the
//! response carries the ledger error's status plus the stored `record_id`.
//!
//! Amounts are rounded to the ledger scale before anything is stored, and
//! amounts outside the ledger range are rejected without a record.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::currency::{is_storable, round_amount};
use tally_core::ledger::{LedgerError, LedgerSync, TransactionEvent};
use tally_db::{CategoryRepository, TransactionRecordRepository, repositories::TransactionRecord};
use tally_shared::AppError;
use tally_shared::types::{BusinessId, CategoryId, CurrencyCode, PageResponse, TransactionRecordId};
use tracing::info;

use super::PageQuery;
use crate::{AppState, error::ApiError};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/businesses/{business_id}/transactions",
        get(list_transactions).post(create_transaction),
    )
}

/// Request body for recording a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Income or expense category.
    pub category_id: CategoryId,
    /// Date of the event.
    pub date: NaiveDate,
    /// Positive amount in `currency`.
    pub amount: Decimal,
    /// Currency of the amount; the business's base currency when omitted.
    pub currency: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// GET /businesses/{business_id}/transactions - List recorded transactions.
async fn list_transactions(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<TransactionRecord>>, ApiError> {
    state.business(business_id).await?;
    let page = TransactionRecordRepository::new((*state.db).clone())
        .list(business_id, &query.to_request())
        .await?;
    Ok(Json(page))
}

/// POST /businesses/{business_id}/transactions - Record a transaction and post it.
async fn create_transaction(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionRecord>), ApiError> {
    // rejected amounts never become records
    let amount = round_amount(payload.amount);
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount.into());
    }
    if amount < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount.into());
    }
    if !is_storable(amount) {
        return Err(LedgerError::AmountOutOfRange(amount).into());
    }

    let business = state.business(business_id).await?;
    let category = CategoryRepository::new((*state.db).clone())
        .get(business_id, payload.category_id)
        .await?;
    let currency = match payload.currency.as_deref() {
        Some(code) => {
            CurrencyCode::parse(code).map_err(|e| AppError::Validation(e.to_string()))?
        }
        None => business.base_currency.clone(),
    };

    let event = TransactionEvent {
        date: payload.date,
        amount,
        currency,
        description: payload.description,
    };
    let record_id = TransactionRecordId::new();
    let result = state
        .ledger_for(business_id)
        .post(&business, &category, &event)
        .await;
    let sync = LedgerSync::from_post(business_id, record_id, &result);

    let record = TransactionRecord {
        id: record_id,
        business_id,
        category_id: category.id,
        event,
        sync,
        created_at: Utc::now(),
    };
    TransactionRecordRepository::new((*state.db).clone())
        .insert(&record)
        .await?;

    info!(
        %business_id,
        %record_id,
        ledger_status = record.sync.as_str(),
        "transaction recorded"
    );
    match result {
        Ok(_) => Ok((StatusCode::CREATED, Json(record))),
        Err(source) => Err(ApiError::PostingFailed { record_id, source }),
    }
}
