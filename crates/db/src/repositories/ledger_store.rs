//! Postgres-backed [`LedgerStore`].
//!
//! Every write runs in one database transaction. The balance trigger is
//! deferred, so an unbalanced entry fails at commit and leaves nothing
//! behind.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, LoaderTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tally_core::chart::Account;
use tally_core::ledger::{
    EntryFilter, EntryStatus, JournalEntry, JournalLine, LedgerStore, StoreError,
};
use tally_shared::types::{BusinessId, JournalEntryId};
use tracing::debug;

use super::is_unique_violation;
use crate::entities::sea_orm_active_enums::{EntryStatus as DbEntryStatus, LineSide};
use crate::entities::{accounts, journal_entries, journal_lines};

/// [`LedgerStore`] over a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SeaOrmLedgerStore {
    db: DatabaseConnection,
}

impl SeaOrmLedgerStore {
    /// Creates a new store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn store_error(err: DbErr) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("invalid stored {what}: {detail}"))
}

fn to_account(model: accounts::Model) -> Account {
    Account {
        id: model.id.into(),
        business_id: model.business_id.into(),
        account_type: model.account_type.into(),
        name: model.name,
        code: model.code,
        is_default: model.is_default,
    }
}

fn to_entry(
    model: journal_entries::Model,
    mut lines: Vec<journal_lines::Model>,
) -> Result<JournalEntry, StoreError> {
    let status = match (model.status, model.reversal_entry_id) {
        (DbEntryStatus::Posted, None) => EntryStatus::Posted,
        (DbEntryStatus::Void, Some(reversal)) => EntryStatus::Void {
            reversal_entry_id: reversal.into(),
        },
        (status, reversal) => {
            return Err(corrupt(
                "entry status",
                format!("{status:?} with reversal {reversal:?}"),
            ));
        }
    };

    lines.sort_by_key(|l| l.line_number);
    let lines = lines
        .into_iter()
        .map(|l| JournalLine {
            id: l.id.into(),
            journal_entry_id: l.journal_entry_id.into(),
            account_id: l.account_id.into(),
            side: l.side.into(),
            amount: l.amount,
        })
        .collect();

    Ok(JournalEntry {
        id: model.id.into(),
        business_id: model.business_id.into(),
        transaction_date: model.transaction_date,
        description: model.description,
        status,
        reverses_entry_id: model.reverses_entry_id.map(Into::into),
        created_at: model.created_at.with_timezone(&Utc),
        lines,
    })
}

#[async_trait]
impl LedgerStore for SeaOrmLedgerStore {
    async fn accounts(&self, business_id: BusinessId) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::BusinessId.eq(business_id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(store_error)
            .map(|models| models.into_iter().map(to_account).collect())
    }

    async fn insert_accounts(&self, new_accounts: &[Account]) -> Result<(), StoreError> {
        if new_accounts.is_empty() {
            return Ok(());
        }
        let now = Utc::now().fixed_offset();
        let models = new_accounts.iter().map(|a| accounts::ActiveModel {
            id: Set(a.id.into_inner()),
            business_id: Set(a.business_id.into_inner()),
            code: Set(a.code.clone()),
            name: Set(a.name.clone()),
            account_type: Set(a.account_type.into()),
            is_default: Set(a.is_default),
            created_at: Set(now),
        });

        // single statement, so a duplicate anywhere inserts nothing
        accounts::Entity::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;

        journal_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            business_id: Set(entry.business_id.into_inner()),
            transaction_date: Set(entry.transaction_date),
            description: Set(entry.description.clone()),
            status: Set(DbEntryStatus::from(&entry.status)),
            reversal_entry_id: Set(entry.status.reversal_entry_id().map(Into::into)),
            reverses_entry_id: Set(entry.reverses_entry_id.map(Into::into)),
            created_at: Set(entry.created_at.fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(store_error)?;

        let lines = entry.lines.iter().zip(1..).map(|(line, number)| {
            journal_lines::ActiveModel {
                id: Set(line.id.into_inner()),
                journal_entry_id: Set(entry.id.into_inner()),
                account_id: Set(line.account_id.into_inner()),
                line_number: Set(number),
                side: Set(LineSide::from(line.side)),
                amount: Set(line.amount),
            }
        });
        journal_lines::Entity::insert_many(lines)
            .exec(&txn)
            .await
            .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;
        debug!(entry_id = %entry.id, lines = entry.lines.len(), "journal entry stored");
        Ok(())
    }

    async fn find_entry(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let Some(model) = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::BusinessId.eq(business_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::JournalEntryId.eq(model.id))
            .all(&self.db)
            .await
            .map_err(store_error)?;

        to_entry(model, lines).map(Some)
    }

    async fn find_reversal(
        &self,
        business_id: BusinessId,
        original_id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let Some(model) = journal_entries::Entity::find()
            .filter(journal_entries::Column::BusinessId.eq(business_id.into_inner()))
            .filter(journal_entries::Column::ReversesEntryId.eq(original_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        let lines = model
            .find_related(journal_lines::Entity)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        to_entry(model, lines).map(Some)
    }

    async fn list_entries(
        &self,
        business_id: BusinessId,
        filter: &EntryFilter,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let mut query = journal_entries::Entity::find()
            .filter(journal_entries::Column::BusinessId.eq(business_id.into_inner()));

        if let Some(void) = filter.void {
            let status = if void {
                DbEntryStatus::Void
            } else {
                DbEntryStatus::Posted
            };
            query = query.filter(journal_entries::Column::Status.eq(status));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(journal_entries::Column::TransactionDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(journal_entries::Column::TransactionDate.lte(to));
        }

        let entries = query
            .order_by_asc(journal_entries::Column::TransactionDate)
            .order_by_asc(journal_entries::Column::CreatedAt)
            .order_by_asc(journal_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        let lines = entries
            .load_many(journal_lines::Entity, &self.db)
            .await
            .map_err(store_error)?;

        entries
            .into_iter()
            .zip(lines)
            .map(|(entry, lines)| to_entry(entry, lines))
            .collect()
    }

    async fn mark_void(
        &self,
        business_id: BusinessId,
        entry_id: JournalEntryId,
        reversal_entry_id: JournalEntryId,
    ) -> Result<(), StoreError> {
        // compare-and-set: only a posted entry flips
        let result = journal_entries::Entity::update_many()
            .set(journal_entries::ActiveModel {
                status: Set(DbEntryStatus::Void),
                reversal_entry_id: Set(Some(reversal_entry_id.into_inner())),
                ..Default::default()
            })
            .filter(journal_entries::Column::Id.eq(entry_id.into_inner()))
            .filter(journal_entries::Column::BusinessId.eq(business_id.into_inner()))
            .filter(journal_entries::Column::Status.eq(DbEntryStatus::Posted))
            .exec(&self.db)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        let exists = journal_entries::Entity::find_by_id(entry_id.into_inner())
            .filter(journal_entries::Column::BusinessId.eq(business_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .is_some();
        if exists {
            Err(StoreError::Conflict(format!("entry {entry_id} is not posted")))
        } else {
            Err(StoreError::NotFound(format!("entry {entry_id}")))
        }
    }
}
