//! API route definitions.
//!
//! Everything below `/businesses/{business_id}` is scoped to that business;
//! nothing reads or writes across businesses.

use axum::Router;
use serde::Deserialize;
use tally_shared::types::PageRequest;

use crate::AppState;

pub mod accounts;
pub mod businesses;
pub mod categories;
pub mod exchange_rates;
pub mod health;
pub mod journal_entries;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(businesses::routes())
        .merge(accounts::routes())
        .merge(categories::routes())
        .merge(transactions::routes())
        .merge(journal_entries::routes())
        .merge(exchange_rates::routes())
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Converts to a clamped page request.
    #[must_use]
    pub fn to_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
        .clamped()
    }
}
