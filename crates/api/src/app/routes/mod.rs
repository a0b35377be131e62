use axum::{Router, routing::get};

pub mod monitoring;
pub mod orders;
pub mod products;
pub mod shipments;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/metrics", get(system::metrics))
        .route("/notifications", get(system::notifications))
        .route("/stream", get(system::stream))
        .nest("/orders", orders::router())
        .nest("/products", products::router())
        .nest("/shipments", shipments::router())
        .nest("/monitoring", monitoring::router())
}
