use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    PgStore, ProductScope, ProductStore, StoreError, map_write_error, push_list_filter, push_page,
};
use crate::models::{Page, Product, ProductChanges, ProductDetails, ProductDraft, UserSummary};

const SEARCH_COLUMNS: &[&str] = &["p.name", "p.description"];

/// Projection joining a product to its creator. `FROM` must alias the
/// product relation as `p`.
const DETAILS_COLUMNS: &str = "p.*, u.full_name AS creator_full_name, u.email_id AS creator_email_id";

#[derive(sqlx::FromRow)]
struct ProductRow {
    #[sqlx(flatten)]
    product: Product,
    creator_full_name: String,
    creator_email_id: String,
}

impl From<ProductRow> for ProductDetails {
    fn from(row: ProductRow) -> Self {
        let p = row.product;
        ProductDetails {
            id: p.id,
            name: p.name,
            description: p.description,
            image: p.image,
            created_by: UserSummary {
                id: p.created_by,
                full_name: row.creator_full_name,
                email_id: row.creator_email_id,
            },
            updated_by: p.updated_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

pub async fn create(
    pool: &PgPool,
    draft: &ProductDraft,
    created_by: Uuid,
    at: DateTime<Utc>,
) -> Result<ProductDetails, sqlx::Error> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "WITH p AS (
            INSERT INTO products (id, name, description, image, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING *
         )
         SELECT {DETAILS_COLUMNS} FROM p JOIN users u ON u.id = p.created_by"
    ))
    .bind(Uuid::now_v7())
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(&draft.image)
    .bind(created_by)
    .bind(at)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ProductDetails>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {DETAILS_COLUMNS} FROM products p JOIN users u ON u.id = p.created_by
         WHERE p.id = $1 AND p.deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &ProductScope) {
    push_list_filter(qb, &scope.filter, "p.created_at", SEARCH_COLUMNS);
    if let Some(owner) = scope.owner {
        qb.push(" AND p.created_by = ").push_bind(owner);
    }
}

pub async fn list(
    pool: &PgPool,
    scope: &ProductScope,
    page: Page,
) -> Result<Vec<ProductDetails>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {DETAILS_COLUMNS} FROM products p JOIN users u ON u.id = p.created_by
         WHERE p.deleted_at IS NULL"
    ));
    push_scope(&mut qb, scope);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC");
    push_page(&mut qb, page);

    let rows = qb.build_query_as::<ProductRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn count(pool: &PgPool, scope: &ProductScope) -> Result<i64, sqlx::Error> {
    let mut qb =
        QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p WHERE p.deleted_at IS NULL");
    push_scope(&mut qb, scope);

    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &ProductChanges,
    updated_by: Uuid,
    at: DateTime<Utc>,
) -> Result<Option<ProductDetails>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "WITH p AS (
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                image = COALESCE($4, image),
                updated_by = $5,
                updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
         )
         SELECT {DETAILS_COLUMNS} FROM p JOIN users u ON u.id = p.created_by"
    ))
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.image.as_deref())
    .bind(updated_by)
    .bind(at)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

pub async fn soft_delete(pool: &PgPool, id: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(
        &self,
        draft: ProductDraft,
        created_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<ProductDetails, StoreError> {
        create(self.pool(), &draft, created_by, at)
            .await
            .map_err(map_write_error)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<ProductDetails>, StoreError> {
        Ok(find_by_id(self.pool(), id).await?)
    }

    async fn list_products(
        &self,
        scope: &ProductScope,
        page: Page,
    ) -> Result<Vec<ProductDetails>, StoreError> {
        Ok(list(self.pool(), scope, page).await?)
    }

    async fn count_products(&self, scope: &ProductScope) -> Result<i64, StoreError> {
        Ok(count(self.pool(), scope).await?)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
        updated_by: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<ProductDetails>, StoreError> {
        Ok(update(self.pool(), id, &changes, updated_by, at).await?)
    }

    async fn soft_delete_product(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(soft_delete(self.pool(), id, at).await?)
    }
}
