//! Category routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tally_core::chart::{Category, CategoryKind};
use tally_db::CategoryRepository;
use tally_shared::types::{BusinessId, CategoryId};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/businesses/{business_id}/categories",
        get(list_categories).post(create_category),
    )
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name; must match an account name exactly.
    pub name: String,
    /// `income` or `expense`.
    pub kind: CategoryKind,
}

/// GET /businesses/{business_id}/categories - List categories.
async fn list_categories(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<Json<Vec<Category>>, ApiError> {
    state.business(business_id).await?;
    let categories = CategoryRepository::new((*state.db).clone())
        .list(business_id)
        .await?;
    Ok(Json(categories))
}

/// POST /businesses/{business_id}/categories - Create a category bound to its account.
async fn create_category(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    state.business(business_id).await?;
    let category = state
        .ledger_for(business_id)
        .bind_category(business_id, CategoryId::new(), &payload.name, payload.kind)
        .await?;
    CategoryRepository::new((*state.db).clone())
        .insert(&category)
        .await?;

    info!(
        %business_id,
        category_id = %category.id,
        account_id = %category.account_id,
        "category created"
    );
    Ok((StatusCode::CREATED, Json(category)))
}
