use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::Actor;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::{ListQuery, Paginated, Role, UserProfile};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateRole {
    pub role: Role,
}

pub async fn list(
    State(state): State<SharedState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Paginated<UserProfile>>, AppError> {
    let (page, filter) = query.into_parts()?;
    let users = state.users.list(page, filter).await?;
    Ok(Json(users))
}

pub async fn profile(
    actor: Actor,
    State(state): State<SharedState>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.users.find_profile(actor.id).await?;
    Ok(Json(profile))
}

pub async fn update_role(
    actor: Actor,
    State(state): State<SharedState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateRole>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state.users.update_role(actor.id, id, req.role).await?;
    Ok(Json(profile))
}
