pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

pub fn build_api_router() -> Router<ApiState> {
    Router::new()
        .route(
            "/subscription",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route("/subscription/total", get(handlers::subscriptions_total))
        .route(
            "/subscription/{id}",
            get(handlers::get_subscription)
                .patch(handlers::update_subscription)
                .delete(handlers::delete_subscription),
        )
}
