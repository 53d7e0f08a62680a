//! Category repository.
//!
//! Categories are bound to an account by the engine before they are stored;
//! this layer only persists and loads them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tally_core::chart::Category;
use tally_shared::types::{BusinessId, CategoryId};

use super::is_unique_violation;
use crate::entities::categories;

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// A category with this name already exists in the business.
    #[error("Category '{0}' already exists")]
    Duplicate(String),

    /// Category not found.
    #[error("Category not found: {0}")]
    NotFound(CategoryId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a bound category.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the name is taken in the business.
    pub async fn insert(&self, category: &Category) -> Result<(), CategoryError> {
        let result = categories::ActiveModel {
            id: Set(category.id.into_inner()),
            business_id: Set(category.business_id.into_inner()),
            name: Set(category.name.clone()),
            kind: Set(category.kind.into()),
            account_id: Set(category.account_id.into_inner()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(CategoryError::Duplicate(category.name.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Loads a category of one business.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist in the business.
    pub async fn get(
        &self,
        business_id: BusinessId,
        id: CategoryId,
    ) -> Result<Category, CategoryError> {
        let model = categories::Entity::find_by_id(id.into_inner())
            .filter(categories::Column::BusinessId.eq(business_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(id))?;
        Ok(to_category(model))
    }

    /// Lists a business's categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, business_id: BusinessId) -> Result<Vec<Category>, CategoryError> {
        let models = categories::Entity::find()
            .filter(categories::Column::BusinessId.eq(business_id.into_inner()))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(to_category).collect())
    }
}

fn to_category(model: categories::Model) -> Category {
    Category {
        id: model.id.into(),
        business_id: model.business_id.into(),
        kind: model.kind.into(),
        name: model.name,
        account_id: model.account_id.into(),
    }
}
