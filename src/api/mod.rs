pub mod admin;
pub mod apartments;
pub mod auth;
pub mod buildings;
pub mod charges;
pub mod payments;
pub mod reports;
pub mod services;
pub mod tasks;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/admin", admin::routes())
        .nest("/buildings", buildings::routes())
        .nest("/apartments", apartments::routes())
        .nest("/services", services::routes())
        .nest("/charges", charges::routes())
        .nest("/payments", payments::routes())
        .nest("/reports", reports::routes())
        .nest("/tasks", tasks::routes())
}
