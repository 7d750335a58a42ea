use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserSummary;

const NAME_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 200;

/// Stored product row, soft-deleted or not.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub created_by: Uuid,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A live product with its creator resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub created_by: UserSummary,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        validate_image(&self.image)
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl ProductChanges {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(image) = &self.image {
            validate_image(image)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name should not be empty".to_string()));
    }
    if name.chars().count() > NAME_MAX {
        return Err(AppError::Validation(format!(
            "name must be at most {NAME_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    let len = description.chars().count();
    if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&len) {
        return Err(AppError::Validation(format!(
            "description must be between {DESCRIPTION_MIN} and {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_image(image: &str) -> Result<(), AppError> {
    if image.trim().is_empty() {
        return Err(AppError::Validation("image should not be empty".to_string()));
    }
    Ok(())
}
