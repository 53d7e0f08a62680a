//! API error type and its HTTP rendering.
//!
//! Every error renders as `{"error": CODE, "message": text}`. Server-side
//! failures are logged and their details withheld, except for inconsistent
//! voids, whose message names the entries to reconcile. A transaction whose
//! posting failed also carries the `record_id` it was stored under.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::ledger::LedgerError;
use tally_db::repositories::{
    BusinessError, CategoryError, ExchangeRateError, TransactionRecordError,
};
use tally_shared::AppError;
use tally_shared::types::TransactionRecordId;
use tracing::error;

/// Error returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Error raised by the ledger engine.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Any other application error.
    #[error(transparent)]
    App(#[from] AppError),

    /// The transaction was recorded but posting it to the ledger failed.
    #[error("{source}")]
    PostingFailed {
        /// Id of the stored record.
        record_id: TransactionRecordId,
        /// Why posting failed.
        source: LedgerError,
    },
}

impl ApiError {
    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::Ledger(e) | Self::PostingFailed { source: e, .. } => e.http_status_code(),
            Self::App(e) => e.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Ledger(e) | Self::PostingFailed { source: e, .. } => e.error_code(),
            Self::App(e) => e.error_code(),
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Ledger(e) | Self::PostingFailed { source: e, .. } => e.is_critical(),
            Self::App(AppError::Inconsistent(_)) => true,
            Self::App(_) => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = if self.is_critical() {
            error!(error = %self, code, "ledger needs reconciliation");
            self.to_string()
        } else if status.is_server_error() {
            error!(error = %self, code, "request failed");
            "An error occurred".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({ "error": code, "message": message });
        if let Self::PostingFailed { record_id, .. } = &self {
            body["record_id"] = json!(record_id);
        }
        (status, Json(body)).into_response()
    }
}

impl From<BusinessError> for ApiError {
    fn from(err: BusinessError) -> Self {
        match err {
            BusinessError::NotFound(id) => LedgerError::BusinessNotFound(id).into(),
            BusinessError::EmptyName => AppError::Validation(err.to_string()).into(),
            BusinessError::InvalidCurrency(_) => AppError::Internal(err.to_string()).into(),
            BusinessError::Database(e) => AppError::Database(e.to_string()).into(),
        }
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(id) => LedgerError::CategoryNotFound(id).into(),
            CategoryError::Duplicate(_) => AppError::Conflict(err.to_string()).into(),
            CategoryError::Database(e) => AppError::Database(e.to_string()).into(),
        }
    }
}

impl From<ExchangeRateError> for ApiError {
    fn from(err: ExchangeRateError) -> Self {
        match err {
            ExchangeRateError::InvalidCurrency(_) => AppError::Internal(err.to_string()).into(),
            ExchangeRateError::Database(e) => AppError::Database(e.to_string()).into(),
        }
    }
}

impl From<TransactionRecordError> for ApiError {
    fn from(err: TransactionRecordError) -> Self {
        match err {
            TransactionRecordError::Corrupt(_) => AppError::Internal(err.to_string()).into(),
            TransactionRecordError::Database(e) => AppError::Database(e.to_string()).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use tally_core::ledger::StoreError;
    use tally_shared::types::{BusinessId, JournalEntryId};

    #[rstest]
    #[case(LedgerError::ZeroAmount, StatusCode::BAD_REQUEST, "ZERO_AMOUNT")]
    #[case(
        LedgerError::BusinessNotFound(BusinessId::new()),
        StatusCode::NOT_FOUND,
        "BUSINESS_NOT_FOUND"
    )]
    #[case(
        LedgerError::AlreadyVoided(JournalEntryId::new()),
        StatusCode::CONFLICT,
        "ALREADY_VOIDED"
    )]
    #[case(
        LedgerError::RateUnavailable {
            from: "EUR".to_string(),
            to: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        },
        StatusCode::UNPROCESSABLE_ENTITY,
        "RATE_UNAVAILABLE"
    )]
    fn test_ledger_error_status(
        #[case] err: LedgerError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let err = ApiError::from(err);
        assert_eq!(err.status(), status);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn test_inconsistent_void_is_critical() {
        let err = ApiError::from(LedgerError::VoidInconsistent {
            original: JournalEntryId::new(),
            reversal: JournalEntryId::new(),
            source: StoreError::Backend("connection reset".to_string()),
        });
        assert!(err.is_critical());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_failed_posting_reports_status_and_record_id() {
        let record_id = TransactionRecordId::new();
        let err = ApiError::PostingFailed {
            record_id,
            source: LedgerError::RateUnavailable {
                from: "EUR".to_string(),
                to: "USD".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            },
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "RATE_UNAVAILABLE");
        assert_eq!(body["record_id"], record_id.to_string());
        assert!(body["message"].as_str().unwrap().contains("EUR"));
    }

    #[test]
    fn test_failed_posting_hides_storage_details() {
        let err = ApiError::PostingFailed {
            record_id: TransactionRecordId::new(),
            source: LedgerError::Persistence(StoreError::Backend("connection reset".to_string())),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_critical());
    }

    #[test]
    fn test_repository_errors_map_to_taxonomy() {
        let id = BusinessId::new();
        let err = ApiError::from(BusinessError::NotFound(id));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(CategoryError::Duplicate("Rent".to_string()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
