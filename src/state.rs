use std::sync::Arc;

use crate::auth::jwt::TokenService;
use crate::catalog::ProductCatalog;
use crate::config::Config;
use crate::directory::UserDirectory;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub tokens: TokenService,
    pub users: UserDirectory,
    pub products: ProductCatalog,
}
