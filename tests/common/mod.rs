#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use storefront::config::Config;
use storefront::db::memory::MemoryStore;
use storefront::db::{PgStore, UserStore};
use storefront::models::Role;

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const PASSWORD: &str = "password123";

/// What the running server persists to.
pub enum Backend {
    Memory(Arc<MemoryStore>),
    Postgres { pool: PgPool, db_name: String },
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub users: Arc<dyn UserStore>,
    pub backend: Backend,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn signup(&self, email: &str, full_name: &str) -> (Value, StatusCode) {
        let body = json!({
            "emailId": email,
            "password": PASSWORD,
            "fullName": full_name,
            "phoneNumber": "+15550100",
        });
        self.post(&self.url("/auth/signup"), None, &body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let body = json!({ "email": email, "password": password });
        self.post(&self.url("/auth/login"), None, &body).await
    }

    /// Sign up a plain user and return `(token, user id)`.
    pub async fn user(&self, email: &str) -> (String, String) {
        let (body, status) = self.signup(email, "Test User").await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["userProfile"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Sign up, promote to admin out of band, and log in again for a token
    /// carrying the new role.
    pub async fn admin(&self, email: &str) -> (String, String) {
        let (_, id) = self.user(email).await;
        let uuid: Uuid = id.parse().unwrap();
        self.users
            .update_user_role(uuid, Role::Admin, chrono::Utc::now())
            .await
            .unwrap()
            .expect("admin user missing");

        let (body, status) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        (body["token"].as_str().unwrap().to_string(), id)
    }

    /// Whether the stored row for `id` exists and carries a deletion stamp.
    pub async fn is_soft_deleted(&self, id: Uuid) -> bool {
        match &self.backend {
            Backend::Memory(store) => store
                .product_row(id)
                .is_some_and(|row| row.deleted_at.is_some()),
            Backend::Postgres { pool, .. } => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT deleted_at IS NOT NULL FROM products WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(pool)
                .await
                .expect("soft delete lookup failed")
                .unwrap_or(false)
            }
        }
    }

    /// Create a product, return the product JSON.
    pub async fn create_product(&self, token: &str, name: &str) -> Value {
        self.create_described_product(token, name, "A perfectly ordinary product")
            .await
    }

    pub async fn create_described_product(&self, token: &str, name: &str, description: &str) -> Value {
        let body = json!({
            "name": name,
            "description": description,
            "image": "https://cdn.test/p.png",
        });
        let (body, status) = self.post_auth("/products", token, &body).await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {body}");
        body
    }

    async fn post(&self, url: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let mut req = self.client.post(url).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an unauthenticated GET request.
    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.post(&self.url(path), Some(token), body).await
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PATCH request with JSON body.
    pub async fn patch_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("patch request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        token_ttl: chrono::Duration::minutes(60),
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
    }
}

async fn serve(app: axum::Router, users: Arc<dyn UserStore>, backend: Backend) -> TestApp {
    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        users,
        backend,
        client: Client::new(),
    }
}

/// Spawn a test app over a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let app = storefront::build_app(store.clone(), store.clone(), test_config());
    serve(app, store.clone(), Backend::Memory(store)).await
}

fn database_url_for(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app over a freshly created and migrated Postgres database.
///
/// Returns `None` when `DATABASE_URL` is not set, so callers can skip.
pub async fn spawn_pg_app() -> Option<TestApp> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let db_name = format!("storefront_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url_for(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        ..test_config()
    };
    let store = Arc::new(PgStore::new(pool.clone()));
    let app = storefront::build_app(store.clone(), store.clone(), config);

    Some(serve(app, store, Backend::Postgres { pool, db_name }).await)
}

/// Drop the test database, if any, after a test completes.
pub async fn cleanup(app: TestApp) {
    let Backend::Postgres { pool, db_name } = app.backend else {
        return;
    };
    pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
