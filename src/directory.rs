use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{StoreError, UserStore};
use crate::error::AppError;
use crate::models::{ListFilter, NewUser, Page, Paginated, Role, User, UserProfile};

/// Lookup and administration of user records.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.store.find_user_by_email(email).await?)
    }

    /// Insert a user with the caller-chosen role. Duplicate emails are a
    /// client error, including ones that lost a race with a concurrent signup.
    pub async fn create(&self, user: NewUser) -> Result<User, AppError> {
        self.store
            .insert_user(user, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::BadRequest("User already exists".to_string()),
                other => AppError::Store(other),
            })
    }

    pub async fn find_profile(&self, id: Uuid) -> Result<UserProfile, AppError> {
        self.store
            .find_user_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list(
        &self,
        page: Page,
        filter: ListFilter,
    ) -> Result<Paginated<UserProfile>, AppError> {
        let users = self.store.list_users(&filter, page).await?;
        let total = self.store.count_users(&filter).await?;

        let data = users.into_iter().map(UserProfile::from).collect();
        Ok(Paginated::new(data, total, page))
    }

    pub async fn update_role(
        &self,
        acting_user: Uuid,
        target: Uuid,
        role: Role,
    ) -> Result<UserProfile, AppError> {
        if acting_user == target {
            return Err(AppError::Forbidden(
                "You are not allowed to update this user".to_string(),
            ));
        }

        let user = self
            .store
            .update_user_role(target, role, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %user.id, role = %user.role, by = %acting_user, "User role updated");
        Ok(user.into())
    }
}
