pub mod auth_service;
pub mod charge_service;
pub mod payment_service;

pub use auth_service::AuthService;
