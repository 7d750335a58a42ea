pub mod auth;
pub mod products;
pub mod users;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::SharedState;

/// Every route here must have a matching entry in [`crate::auth::policy::RouteId`].
pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        // Products
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        // Users
        .route("/users", get(users::list))
        .route("/users/profile", get(users::profile))
        .route("/users/{id}/role", patch(users::update_role))
}
