//! Journal entry routes: listing, detail and void.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::ledger::{EntryFilter, EntryView, VoidOutcome};
use tally_shared::AppError;
use tally_shared::types::{BusinessId, JournalEntryId, PageRequest, PageResponse};

use crate::{AppState, error::ApiError};

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/businesses/{business_id}/journal-entries", get(list_entries))
        .route(
            "/businesses/{business_id}/journal-entries/{entry_id}",
            get(get_entry),
        )
        .route(
            "/businesses/{business_id}/journal-entries/{entry_id}/void",
            post(void_entry),
        )
}

/// Query parameters for listing entries.
#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesQuery {
    /// `posted` or `void`; both when omitted.
    pub status: Option<String>,
    /// Inclusive lower date bound.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound.
    pub date_to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListEntriesQuery {
    fn filter(&self) -> Result<EntryFilter, AppError> {
        let void = match self.status.as_deref() {
            None => None,
            Some("posted") => Some(false),
            Some("void") => Some(true),
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "Unknown status '{other}', expected posted or void"
                )));
            }
        };
        Ok(EntryFilter {
            void,
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }

    fn page(&self) -> PageRequest {
        super::PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
        .to_request()
    }
}

/// GET /businesses/{business_id}/journal-entries - List entries with annotated lines.
async fn list_entries(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<PageResponse<EntryView>>, ApiError> {
    let filter = query.filter()?;
    state.business(business_id).await?;
    let page = state
        .ledger_for(business_id)
        .list(business_id, &filter, &query.page())
        .await?;
    Ok(Json(page))
}

/// GET /businesses/{business_id}/journal-entries/{entry_id} - One entry.
async fn get_entry(
    State(state): State<AppState>,
    Path((business_id, entry_id)): Path<(BusinessId, JournalEntryId)>,
) -> Result<Json<EntryView>, ApiError> {
    state.business(business_id).await?;
    let entry = state
        .ledger_for(business_id)
        .entry(business_id, entry_id)
        .await?;
    Ok(Json(entry))
}

/// POST /businesses/{business_id}/journal-entries/{entry_id}/void - Void by reversal.
async fn void_entry(
    State(state): State<AppState>,
    Path((business_id, entry_id)): Path<(BusinessId, JournalEntryId)>,
) -> Result<Json<VoidOutcome>, ApiError> {
    state.business(business_id).await?;
    let outcome = state
        .ledger_for(business_id)
        .void(business_id, entry_id)
        .await?;
    Ok(Json(outcome))
}
