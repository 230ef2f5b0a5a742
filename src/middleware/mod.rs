pub mod auth;
pub mod permissions;

pub use auth::{auth_middleware, is_admin, is_operator_or_higher, AppState, AuthUser};
pub use permissions::{require, role_allows, Permission};
