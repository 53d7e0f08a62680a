//! Raw transaction record repository.
//!
//! A record is stored after its ledger posting has been attempted, carrying
//! the outcome in `ledger_status`.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tally_core::ledger::{LedgerSync, TransactionEvent};
use tally_shared::types::{
    BusinessId, CategoryId, CurrencyCode, PageRequest, PageResponse, TransactionRecordId,
};

use crate::entities::sea_orm_active_enums::LedgerStatus;
use crate::entities::transaction_records;

/// Error types for transaction record operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionRecordError {
    /// A stored row is malformed.
    #[error("Invalid stored transaction record: {0}")]
    Corrupt(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A user-recorded event and whether it reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    /// Record ID.
    pub id: TransactionRecordId,
    /// Owning business.
    pub business_id: BusinessId,
    /// Category the user picked.
    pub category_id: CategoryId,
    /// The event as recorded, in its original currency.
    #[serde(flatten)]
    pub event: TransactionEvent,
    /// Ledger outcome.
    #[serde(flatten)]
    pub sync: LedgerSync,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

/// Transaction record repository.
#[derive(Debug, Clone)]
pub struct TransactionRecordRepository {
    db: DatabaseConnection,
}

impl TransactionRecordRepository {
    /// Creates a new transaction record repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn insert(&self, record: &TransactionRecord) -> Result<(), TransactionRecordError> {
        transaction_records::ActiveModel {
            id: Set(record.id.into_inner()),
            business_id: Set(record.business_id.into_inner()),
            category_id: Set(record.category_id.into_inner()),
            transaction_date: Set(record.event.date),
            amount: Set(record.event.amount),
            currency: Set(record.event.currency.to_string()),
            description: Set(record.event.description.clone()),
            ledger_status: Set(LedgerStatus::from(&record.sync)),
            journal_entry_id: Set(record.sync.journal_entry_id().map(Into::into)),
            failure_reason: Set(record.sync.failure().map(ToString::to_string)),
            created_at: Set(record.created_at.fixed_offset()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// Lists a business's records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        business_id: BusinessId,
        page: &PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, TransactionRecordError> {
        let page = page.clamped();
        let paginator = transaction_records::Entity::find()
            .filter(transaction_records::Column::BusinessId.eq(business_id.into_inner()))
            .order_by_desc(transaction_records::Column::CreatedAt)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let records = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await?
            .into_iter()
            .map(to_record)
            .collect::<Result<_, _>>()?;
        Ok(PageResponse::new(records, page.page, page.per_page, total))
    }
}

fn to_record(model: transaction_records::Model) -> Result<TransactionRecord, TransactionRecordError> {
    let currency = CurrencyCode::parse(&model.currency)
        .map_err(|e| TransactionRecordError::Corrupt(e.to_string()))?;
    let sync = match (model.ledger_status, model.journal_entry_id) {
        (LedgerStatus::Synced, Some(id)) => LedgerSync::Synced {
            journal_entry_id: id.into(),
        },
        (LedgerStatus::Failed, None) => LedgerSync::Failed {
            reason: model.failure_reason.unwrap_or_default(),
        },
        (status, entry) => {
            return Err(TransactionRecordError::Corrupt(format!(
                "ledger status {status:?} with journal entry {entry:?}"
            )));
        }
    };

    Ok(TransactionRecord {
        id: model.id.into(),
        business_id: model.business_id.into(),
        category_id: model.category_id.into(),
        event: TransactionEvent {
            date: model.transaction_date,
            amount: model.amount,
            currency,
            description: model.description,
        },
        sync,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn model(status: LedgerStatus, entry: Option<Uuid>) -> transaction_records::Model {
        transaction_records::Model {
            id: Uuid::now_v7(),
            business_id: Uuid::now_v7(),
            category_id: Uuid::now_v7(),
            transaction_date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            amount: dec!(250),
            currency: "EUR".to_string(),
            description: "Conference".to_string(),
            ledger_status: status,
            journal_entry_id: entry,
            failure_reason: entry.is_none().then(|| "rate missing".to_string()),
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_failed_record_keeps_reason() {
        let record = to_record(model(LedgerStatus::Failed, None)).unwrap();
        assert_eq!(record.sync.failure(), Some("rate missing"));
        assert_eq!(record.event.amount, dec!(250));
    }

    #[test]
    fn test_synced_record_requires_entry() {
        let entry = Uuid::now_v7();
        let record = to_record(model(LedgerStatus::Synced, Some(entry))).unwrap();
        assert_eq!(record.sync.journal_entry_id(), Some(entry.into()));
        assert!(to_record(model(LedgerStatus::Synced, None)).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let record = to_record(model(LedgerStatus::Failed, None)).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ledger_status"], "failed");
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["reason"], "rate missing");
    }
}
