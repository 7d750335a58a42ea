use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::extractor::Actor;
use crate::db::{ProductScope, ProductStore};
use crate::error::AppError;
use crate::models::{ListFilter, Page, Paginated, ProductChanges, ProductDetails, ProductDraft};

/// Product reads and writes on behalf of an authenticated actor.
///
/// Listing visibility comes from the actor alone: plain users see only what
/// they created. Mutation requires being the creator, whatever the role.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn ProductStore>,
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

impl ProductCatalog {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &Actor, draft: ProductDraft) -> Result<ProductDetails, AppError> {
        draft.validate()?;

        let product = self.store.insert_product(draft, actor.id, Utc::now()).await?;
        tracing::info!(product_id = %product.id, user_id = %actor.id, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductDetails, AppError> {
        self.store.find_product(id).await?.ok_or_else(not_found)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        page: Page,
        filter: ListFilter,
    ) -> Result<Paginated<ProductDetails>, AppError> {
        let scope = ProductScope {
            filter,
            owner: (!actor.is_admin()).then_some(actor.id),
        };

        let data = self.store.list_products(&scope, page).await?;
        let total = self.store.count_products(&scope).await?;
        Ok(Paginated::new(data, total, page))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<ProductDetails, AppError> {
        changes.validate()?;
        self.require_owner(actor, id, "update").await?;

        let product = self
            .store
            .update_product(id, changes, actor.id, Utc::now())
            .await?
            .ok_or_else(not_found)?;
        tracing::info!(product_id = %id, user_id = %actor.id, "Product updated");
        Ok(product)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.require_owner(actor, id, "delete").await?;

        if !self.store.soft_delete_product(id, Utc::now()).await? {
            return Err(not_found());
        }
        tracing::info!(product_id = %id, user_id = %actor.id, "Product deleted");
        Ok(())
    }

    async fn require_owner(&self, actor: &Actor, id: Uuid, verb: &str) -> Result<(), AppError> {
        let product = self.store.find_product(id).await?.ok_or_else(not_found)?;
        if product.created_by.id != actor.id {
            tracing::warn!(product_id = %id, user_id = %actor.id, "Rejected {verb} by non-owner");
            return Err(AppError::Forbidden(format!(
                "You are not allowed to {verb} this product"
            )));
        }
        Ok(())
    }
}
