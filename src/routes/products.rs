use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::Actor;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::{ListQuery, Paginated, ProductChanges, ProductDetails, ProductDraft};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub image: String,
}

#[derive(Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

pub async fn list(
    actor: Actor,
    State(state): State<SharedState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Paginated<ProductDetails>>, AppError> {
    let (page, filter) = query.into_parts()?;
    let products = state.products.list(&actor, page, filter).await?;
    Ok(Json(products))
}

pub async fn create(
    actor: Actor,
    State(state): State<SharedState>,
    AppJson(req): AppJson<CreateProduct>,
) -> Result<(StatusCode, Json<ProductDetails>), AppError> {
    let draft = ProductDraft {
        name: req.name,
        description: req.description,
        image: req.image,
    };
    let product = state.products.create(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get(
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ProductDetails>, AppError> {
    let product = state.products.get(id).await?;
    Ok(Json(product))
}

pub async fn update(
    actor: Actor,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateProduct>,
) -> Result<Json<ProductDetails>, AppError> {
    let changes = ProductChanges {
        name: req.name,
        description: req.description,
        image: req.image,
    };
    let product = state.products.update(&actor, id, changes).await?;
    Ok(Json(product))
}

pub async fn delete(
    actor: Actor,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.products.delete(&actor, id).await?;
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
