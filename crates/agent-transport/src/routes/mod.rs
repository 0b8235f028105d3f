//! API route definitions: the agent operational surface plus the inbound
//! A2A message endpoint.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::openapi::ApiDoc;
use crate::server::AppState;

/// Routes making up the operational surface plus the A2A receive endpoint.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/skills/:name/reload", post(handlers::reload_skill))
        .route("/discovery", get(handlers::discovery_info))
        .route("/version", get(handlers::version_info))
        .route("/a2a/messages", post(handlers::receive_a2a_message))
        .with_state(state)
}

/// The full application router: operational routes plus Swagger UI at
/// `/swagger-ui`, serving the raw spec at `/api-docs/openapi.json`.
pub fn create_app(state: Arc<AppState>) -> Router {
    api_routes(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
}
