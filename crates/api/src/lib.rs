//! HTTP API layer with Axum routes over the ledger engine.
//!
//! This crate provides:
//! - REST API routes
//! - Error-to-response mapping
//! - Application state wiring the engine to Postgres

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use tally_core::ledger::{Business, LedgerService};
use tally_db::{BusinessRates, BusinessRepository, ExchangeRateRepository, SeaOrmLedgerStore};
use tally_shared::LedgerConfig;
use tally_shared::types::BusinessId;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// The engine as the API runs it: Postgres storage, per-business rates.
pub type Ledger = LedgerService<SeaOrmLedgerStore, BusinessRates>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Ledger engine settings.
    pub ledger: Arc<LedgerConfig>,
    /// Upper bound on request handling time.
    pub request_timeout: Duration,
}

impl AppState {
    /// Creates state with a 30 second request timeout.
    #[must_use]
    pub fn new(db: DatabaseConnection, ledger: LedgerConfig) -> Self {
        Self {
            db: Arc::new(db),
            ledger: Arc::new(ledger),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the ledger service for one business.
    #[must_use]
    pub fn ledger_for(&self, business_id: BusinessId) -> Ledger {
        let db = (*self.db).clone();
        let rates = BusinessRates::new(ExchangeRateRepository::new(db.clone()), business_id);
        LedgerService::new(Arc::new(SeaOrmLedgerStore::new(db)), Arc::new(rates))
            .with_cash_account(self.ledger.cash_account_name.clone())
    }

    /// Loads a business that must exist.
    ///
    /// # Errors
    ///
    /// Returns `BUSINESS_NOT_FOUND` if there is no such business.
    pub async fn business(&self, id: BusinessId) -> Result<Business, ApiError> {
        Ok(BusinessRepository::new((*self.db).clone()).get(id).await?)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TimeoutLayer::new(state.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn offline_state() -> AppState {
        AppState::new(DatabaseConnection::Disconnected, LedgerConfig::default())
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(offline_state())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    async fn call(uri: &str) -> (StatusCode, serde_json::Value) {
        send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(uri: &str, body: &serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(request).await
    }

    #[tokio::test]
    async fn test_health_needs_no_database() {
        let (status, body) = call("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_database_failure_is_reported_without_details() {
        let uri = format!("/api/v1/businesses/{}", BusinessId::new());
        let (status, body) = call(&uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_malformed_business_id() {
        let (status, _) = call("/api/v1/businesses/not-a-uuid/accounts").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_readiness_reports_missing_database() {
        let (status, body) = call("/api/v1/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected_before_any_write() {
        let uri = format!("/api/v1/businesses/{}/transactions", BusinessId::new());
        let body = serde_json::json!({
            "category_id": tally_shared::types::CategoryId::new(),
            "date": "2026-03-01",
            "amount": "0",
        });
        let (status, body) = post_json(&uri, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ZERO_AMOUNT");
    }

    #[tokio::test]
    async fn test_out_of_range_amount_is_rejected_before_any_write() {
        // the offline state has no database, so reaching a write would be a 500
        let uri = format!("/api/v1/businesses/{}/transactions", BusinessId::new());
        let body = serde_json::json!({
            "category_id": tally_shared::types::CategoryId::new(),
            "date": "2026-03-01",
            "amount": "1000000000000000",
            "currency": "EUR",
        });
        let (status, body) = post_json(&uri, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "AMOUNT_OUT_OF_RANGE");
    }

    #[tokio::test]
    async fn test_amount_rounding_to_zero_is_rejected() {
        let uri = format!("/api/v1/businesses/{}/transactions", BusinessId::new());
        let body = serde_json::json!({
            "category_id": tally_shared::types::CategoryId::new(),
            "date": "2026-03-01",
            "amount": "0.00004",
        });
        let (status, body) = post_json(&uri, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ZERO_AMOUNT");
    }

    #[tokio::test]
    async fn test_same_currency_rate_is_rejected() {
        let uri = format!("/api/v1/businesses/{}/exchange-rates", BusinessId::new());
        let body = serde_json::json!({
            "from_currency": "usd",
            "to_currency": "USD",
            "rate": "1",
            "effective_date": "2026-03-01",
        });
        let (status, body) = post_json(&uri, &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_EXCHANGE_RATE");
    }

    #[tokio::test]
    async fn test_unknown_entry_status_filter() {
        let uri = format!(
            "/api/v1/businesses/{}/journal-entries?status=draft",
            BusinessId::new()
        );
        let (status, body) = call(&uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
