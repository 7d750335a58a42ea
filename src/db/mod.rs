pub mod memory;
pub mod products;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    ListFilter, NewUser, Page, ProductChanges, ProductDetails, ProductDraft, Role, User,
};

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value for unique field '{0}'")]
    Duplicate(&'static str),
    #[error("broken reference: {0}")]
    Integrity(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. Soft-deleted users are invisible to every
/// lookup, but their email stays reserved.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser, at: DateTime<Utc>) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Newest first.
    async fn list_users(&self, filter: &ListFilter, page: Page) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self, filter: &ListFilter) -> Result<i64, StoreError>;
    async fn update_user_role(
        &self,
        id: Uuid,
        role: Role,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;
}

/// Which products a listing may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductScope {
    pub filter: ListFilter,
    /// Restrict to products created by this user.
    pub owner: Option<Uuid>,
}

/// Persistence for products. Every read and mutation skips soft-deleted rows.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(
        &self,
        draft: ProductDraft,
        created_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ProductDetails, StoreError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<ProductDetails>, StoreError>;
    /// Newest first.
    async fn list_products(
        &self,
        scope: &ProductScope,
        page: Page,
    ) -> Result<Vec<ProductDetails>, StoreError>;
    async fn count_products(&self, scope: &ProductScope) -> Result<i64, StoreError>;
    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
        updated_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<ProductDetails>, StoreError>;
    /// Returns false when no live product has this id.
    async fn soft_delete_product(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Duplicate("email_id")
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            StoreError::Integrity(db_err.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// Append ` AND ...` clauses for `filter`. The builder must already contain a
/// `WHERE` clause.
fn push_list_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &ListFilter,
    created_column: &str,
    search_columns: &[&str],
) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (");
        for (i, column) in search_columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        qb.push(")");
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND ").push(created_column).push(" >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND ").push(created_column).push(" <= ").push_bind(to);
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
}

/// Escape LIKE metacharacters so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
