pub mod pagination;
pub mod product;
pub mod user;

pub use pagination::{ListFilter, ListQuery, Page, Paginated};
pub use product::{Product, ProductChanges, ProductDetails, ProductDraft};
pub use user::{NewUser, Role, User, UserProfile, UserSummary};
