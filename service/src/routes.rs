//! Route definitions for the reporting service.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the Axum router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Dashboards and report viewers call from arbitrary origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let reports = Router::new()
        .route(
            "/generate",
            post(handlers::generate_report).get(handlers::generate_report_get),
        )
        .route("/health", get(handlers::reports_health))
        .route("/types", get(handlers::report_types));

    let knowledge = Router::new()
        .route("/status", get(handlers::knowledge_status))
        .route("/add-documentation", post(handlers::add_documentation))
        .route("/search", post(handlers::search_knowledge))
        .route("/cleanup", post(handlers::cleanup_knowledge));

    let data = Router::new()
        .route("/collect", post(handlers::collect_data))
        .route("/summaries", get(handlers::data_summaries));

    Router::new()
        .nest("/api/reports", reports)
        .nest("/api/knowledge", knowledge)
        .nest("/api/data", data)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::AppConfig;

    #[test]
    fn test_router_construction() {
        let state = Arc::new(AppState::new(AppConfig::default()));
        let _router = create_router(state);
    }
}
