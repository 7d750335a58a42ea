use std::sync::LazyLock;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::Identity;
use crate::auth::password;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::{NewUser, Role, User, UserProfile};
use crate::state::SharedState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email_id: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_profile: UserProfile,
}

fn require_email(field: &str, value: &str) -> Result<(), AppError> {
    if !EMAIL_RE.is_match(value) {
        return Err(AppError::Validation(format!("{field} must be an email")));
    }
    Ok(())
}

fn require_present(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn auth_response(state: &SharedState, user: User) -> Result<AuthResponse, AppError> {
    let token = state.tokens.issue(&Identity::from(&user))?;
    Ok(AuthResponse {
        token,
        user_profile: user.into(),
    })
}

pub async fn signup(
    State(state): State<SharedState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    require_email("emailId", &req.email_id)?;
    require_present("password", &req.password)?;
    require_present("fullName", &req.full_name)?;
    require_present("phoneNumber", &req.phone_number)?;

    if state.users.find_by_email(&req.email_id).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Self-service accounts are never admins.
    let user = state
        .users
        .create(NewUser {
            full_name: req.full_name,
            email_id: req.email_id,
            phone_number: req.phone_number,
            password_hash,
            role: Role::User,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

pub async fn login(
    State(state): State<SharedState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    require_email("email", &req.email)?;
    require_present("password", &req.password)?;

    let Some(user) = state.users.find_by_email(&req.email).await? else {
        password::verify_missing(&req.password);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    if !password::verify(&req.password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    Ok(Json(auth_response(&state, user)?))
}
