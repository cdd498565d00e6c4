use axum::{routing::get, Router};

pub mod dashboard;
pub mod movements;
pub mod products;
pub mod suppliers;
pub mod system;

/// Number of history rows returned by the movement views.
pub const RECENT_MOVEMENTS_LIMIT: usize = 20;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/dashboard", get(dashboard::overview))
        .nest("/products", products::router())
        .nest("/suppliers", suppliers::router())
        .nest("/inbound", movements::inbound_router())
        .nest("/outbound", movements::outbound_router())
}
