//! Route-level access rules.
//!
//! Every guarded route is declared here once, with the roles allowed to call
//! it. The guard middleware resolves the matched route against this table
//! before any handler runs; a route missing from the table is refused.

use crate::models::Role;

/// Any authenticated actor, regardless of role.
const ANY_ROLE: &[Role] = &[];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// A valid token is required; an empty slice accepts every role.
    Authenticated(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteId {
    Login,
    Signup,
    ListProducts,
    CreateProduct,
    GetProduct,
    UpdateProduct,
    DeleteProduct,
    ListUsers,
    Profile,
    UpdateUserRole,
}

impl RouteId {
    pub const ALL: [RouteId; 10] = [
        RouteId::Login,
        RouteId::Signup,
        RouteId::ListProducts,
        RouteId::CreateProduct,
        RouteId::GetProduct,
        RouteId::UpdateProduct,
        RouteId::DeleteProduct,
        RouteId::ListUsers,
        RouteId::Profile,
        RouteId::UpdateUserRole,
    ];

    /// HTTP method and router path template.
    pub fn endpoint(self) -> (&'static str, &'static str) {
        match self {
            RouteId::Login => ("POST", "/auth/login"),
            RouteId::Signup => ("POST", "/auth/signup"),
            RouteId::ListProducts => ("GET", "/products"),
            RouteId::CreateProduct => ("POST", "/products"),
            RouteId::GetProduct => ("GET", "/products/{id}"),
            RouteId::UpdateProduct => ("PUT", "/products/{id}"),
            RouteId::DeleteProduct => ("DELETE", "/products/{id}"),
            RouteId::ListUsers => ("GET", "/users"),
            RouteId::Profile => ("GET", "/users/profile"),
            RouteId::UpdateUserRole => ("PATCH", "/users/{id}/role"),
        }
    }

    // Ownership on product mutation is enforced by the catalog, not here.
    pub fn access(self) -> Access {
        match self {
            RouteId::Login | RouteId::Signup => Access::Public,
            RouteId::ListProducts
            | RouteId::CreateProduct
            | RouteId::GetProduct
            | RouteId::UpdateProduct
            | RouteId::DeleteProduct
            | RouteId::Profile => Access::Authenticated(ANY_ROLE),
            RouteId::ListUsers | RouteId::UpdateUserRole => Access::Authenticated(ADMIN_ONLY),
        }
    }

    pub fn resolve(method: &str, path: &str) -> Option<RouteId> {
        Self::ALL
            .into_iter()
            .find(|route| route.endpoint() == (method, path))
    }
}

pub fn authorize(role: Role, required: &[Role]) -> bool {
    required.is_empty() || required.contains(&role)
}
