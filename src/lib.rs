//! Business directory: REST backend for partners, customers and suppliers over PostgreSQL.

pub mod config;
pub mod entities;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{validate_model, Settings};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use response::{success_created, success_ok, paginated};
pub use routes::{common_routes, entity_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{connect, ensure_database_exists};

use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies larger than this are rejected.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application router: operational routes at the root, entity resources under `/api`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", entity_routes(state))
        .fallback(routes::not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
