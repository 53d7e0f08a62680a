//! Business repository.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use tally_core::ledger::Business;
use tally_shared::types::{BusinessId, CurrencyCode};

use crate::entities::businesses;

/// Error types for business operations.
#[derive(Debug, thiserror::Error)]
pub enum BusinessError {
    /// Business not found.
    #[error("Business not found: {0}")]
    NotFound(BusinessId),

    /// Name is blank.
    #[error("Business name must not be empty")]
    EmptyName,

    /// A stored currency code is malformed.
    #[error("Invalid stored currency code '{0}'")]
    InvalidCurrency(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Business repository.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    db: DatabaseConnection,
}

impl BusinessRepository {
    /// Creates a new business repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a business.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` for a blank name, or a database error.
    pub async fn create(
        &self,
        name: &str,
        base_currency: CurrencyCode,
    ) -> Result<Business, BusinessError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BusinessError::EmptyName);
        }

        let model = businesses::ActiveModel {
            id: Set(BusinessId::new().into_inner()),
            name: Set(name.to_string()),
            base_currency: Set(base_currency.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        to_business(model)
    }

    /// Finds a business by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: BusinessId) -> Result<Option<Business>, BusinessError> {
        businesses::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(to_business)
            .transpose()
    }

    /// Loads a business that must exist.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such business.
    pub async fn get(&self, id: BusinessId) -> Result<Business, BusinessError> {
        self.find(id).await?.ok_or(BusinessError::NotFound(id))
    }

    /// Lists all businesses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<Business>, BusinessError> {
        businesses::Entity::find()
            .order_by_asc(businesses::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_business)
            .collect()
    }
}

fn to_business(model: businesses::Model) -> Result<Business, BusinessError> {
    let base_currency = CurrencyCode::parse(&model.base_currency)
        .map_err(|_| BusinessError::InvalidCurrency(model.base_currency.clone()))?;
    Ok(Business {
        id: model.id.into(),
        name: model.name,
        base_currency,
    })
}
