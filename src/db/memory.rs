use std::cmp::Reverse;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ProductScope, ProductStore, StoreError, UserStore};
use crate::models::{
    ListFilter, NewUser, Page, Product, ProductChanges, ProductDetails, ProductDraft, Role, User,
    UserSummary,
};

/// In-process store with the same visibility rules as [`super::PgStore`].
///
/// Intended for tests and local development. Lock order is always
/// products before users.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    products: RwLock<Vec<Product>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw product row, including soft-deleted ones.
    pub fn product_row(&self, id: Uuid) -> Option<Product> {
        self.products
            .read()
            .ok()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    #[cfg(test)]
    pub(crate) fn mark_user_deleted(&self, id: Uuid, at: DateTime<Utc>) {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.deleted_at = Some(at);
        }
    }

    fn details(product: &Product, users: &[User]) -> Option<ProductDetails> {
        let creator = users.iter().find(|u| u.id == product.created_by)?;
        Some(ProductDetails {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            created_by: UserSummary::from(creator),
            updated_by: product.updated_by,
            created_at: product.created_at,
            updated_at: product.updated_at,
        })
    }

    fn matching_users(users: &[User], filter: &ListFilter) -> Vec<User> {
        let mut matched: Vec<User> = users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .filter(|u| filter.matches_text(&[u.full_name.as_str(), u.email_id.as_str()]))
            .filter(|u| filter.matches_created(u.created_at))
            .cloned()
            .collect();
        matched.sort_by_key(|u| Reverse((u.created_at, u.id)));
        matched
    }

    fn matching_products(products: &[Product], scope: &ProductScope) -> Vec<Product> {
        let mut matched: Vec<Product> = products
            .iter()
            .filter(|p| p.deleted_at.is_none())
            .filter(|p| scope.owner.is_none_or(|owner| p.created_by == owner))
            .filter(|p| scope.filter.matches_text(&[p.name.as_str(), p.description.as_str()]))
            .filter(|p| scope.filter.matches_created(p.created_at))
            .cloned()
            .collect();
        matched.sort_by_key(|p| Reverse((p.created_at, p.id)));
        matched
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser, at: DateTime<Utc>) -> Result<User, StoreError> {
        let mut users = write(&self.users)?;
        if users.iter().any(|u| u.email_id == user.email_id) {
            return Err(StoreError::Duplicate("email_id"));
        }

        let record = User {
            id: Uuid::now_v7(),
            full_name: user.full_name,
            email_id: user.email_id,
            phone_number: user.phone_number,
            password_hash: user.password_hash,
            role: user.role,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = read(&self.users)?;
        Ok(users
            .iter()
            .find(|u| u.deleted_at.is_none() && u.email_id == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = read(&self.users)?;
        Ok(users
            .iter()
            .find(|u| u.deleted_at.is_none() && u.id == id)
            .cloned())
    }

    async fn list_users(&self, filter: &ListFilter, page: Page) -> Result<Vec<User>, StoreError> {
        let users = read(&self.users)?;
        Ok(window(Self::matching_users(&users, filter), page))
    }

    async fn count_users(&self, filter: &ListFilter) -> Result<i64, StoreError> {
        let users = read(&self.users)?;
        Ok(Self::matching_users(&users, filter).len() as i64)
    }

    async fn update_user_role(
        &self,
        id: Uuid,
        role: Role,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let mut users = write(&self.users)?;
        let Some(user) = users
            .iter_mut()
            .find(|u| u.deleted_at.is_none() && u.id == id)
        else {
            return Ok(None);
        };
        user.role = role;
        user.updated_at = at;
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(
        &self,
        draft: ProductDraft,
        created_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ProductDetails, StoreError> {
        let mut products = write(&self.products)?;
        let users = read(&self.users)?;

        let record = Product {
            id: Uuid::now_v7(),
            name: draft.name,
            description: draft.description,
            image: draft.image,
            created_by,
            updated_by: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        };
        let details = Self::details(&record, &users)
            .ok_or_else(|| StoreError::Integrity(format!("unknown creator {created_by}")))?;
        products.push(record);
        Ok(details)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductDetails>, StoreError> {
        let products = read(&self.products)?;
        let users = read(&self.users)?;
        Ok(products
            .iter()
            .find(|p| p.deleted_at.is_none() && p.id == id)
            .and_then(|p| Self::details(p, &users)))
    }

    async fn list_products(
        &self,
        scope: &ProductScope,
        page: Page,
    ) -> Result<Vec<ProductDetails>, StoreError> {
        let products = read(&self.products)?;
        let users = read(&self.users)?;
        Ok(window(Self::matching_products(&products, scope), page)
            .iter()
            .filter_map(|p| Self::details(p, &users))
            .collect())
    }

    async fn count_products(&self, scope: &ProductScope) -> Result<i64, StoreError> {
        let products = read(&self.products)?;
        Ok(Self::matching_products(&products, scope).len() as i64)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
        updated_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<ProductDetails>, StoreError> {
        let mut products = write(&self.products)?;
        let users = read(&self.users)?;

        let Some(product) = products
            .iter_mut()
            .find(|p| p.deleted_at.is_none() && p.id == id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(image) = changes.image {
            product.image = image;
        }
        product.updated_by = Some(updated_by);
        product.updated_at = at;

        Ok(Self::details(product, &users))
    }

    async fn soft_delete_product(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut products = write(&self.products)?;
        match products
            .iter_mut()
            .find(|p| p.deleted_at.is_none() && p.id == id)
        {
            Some(product) => {
                product.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
