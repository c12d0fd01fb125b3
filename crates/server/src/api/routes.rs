use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, queue, registrations, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Queue
        .route("/queue", get(queue::get_queue))
        .route("/queue/history", get(queue::get_history))
        .route("/queue/tickets", post(queue::enroll_ticket))
        .route("/queue/select/{id}", post(queue::select_ticket))
        .route("/queue/next", post(queue::call_next))
        // Dispatcher control
        .route("/queue/start", post(queue::start_dispatch))
        .route("/queue/stop", post(queue::stop_dispatch))
        // Registration
        .route("/registrations", post(registrations::register_patient))
        // Live updates
        .route("/ws", get(ws::ws_handler))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
