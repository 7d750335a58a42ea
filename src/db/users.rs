use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{PgStore, StoreError, UserStore, map_write_error, push_list_filter, push_page};
use crate::models::{ListFilter, NewUser, Page, Role, User};

const SEARCH_COLUMNS: &[&str] = &["full_name", "email_id"];

pub async fn create(pool: &PgPool, user: &NewUser, at: DateTime<Utc>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, full_name, email_id, phone_number, password_hash, role, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&user.full_name)
    .bind(&user.email_id)
    .bind(&user.phone_number)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(at)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email_id = $1 AND deleted_at IS NULL")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool, filter: &ListFilter, page: Page) -> Result<Vec<User>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM users WHERE deleted_at IS NULL");
    push_list_filter(&mut qb, filter, "created_at", SEARCH_COLUMNS);
    qb.push(" ORDER BY created_at DESC, id DESC");
    push_page(&mut qb, page);

    qb.build_query_as::<User>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &ListFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL");
    push_list_filter(&mut qb, filter, "created_at", SEARCH_COLUMNS);

    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn update_role(
    pool: &PgPool,
    id: Uuid,
    role: Role,
    at: DateTime<Utc>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET role = $2, updated_at = $3
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(role.as_str())
    .bind(at)
    .fetch_optional(pool)
    .await
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser, at: DateTime<Utc>) -> Result<User, StoreError> {
        create(self.pool(), &user, at).await.map_err(map_write_error)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(find_by_email(self.pool(), email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(find_by_id(self.pool(), id).await?)
    }

    async fn list_users(&self, filter: &ListFilter, page: Page) -> Result<Vec<User>, StoreError> {
        Ok(list(self.pool(), filter, page).await?)
    }

    async fn count_users(&self, filter: &ListFilter) -> Result<i64, StoreError> {
        Ok(count(self.pool(), filter).await?)
    }

    async fn update_user_role(
        &self,
        id: Uuid,
        role: Role,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        Ok(update_role(self.pool(), id, role, at).await?)
    }
}
