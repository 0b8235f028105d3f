//! HTTP server exposing the Agent Runtime's operational surface and the
//! inbound A2A message endpoint.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::A2aClient;
use crate::discovery::Discovery;
use crate::routes::create_app;
use crate::runtime::AgentRuntime;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub enable_tracing: bool,
    /// Bearer token required on authenticated endpoints (`security_mode = bearer`).
    /// `None` disables authentication (`security_mode = none`).
    pub auth_token: Option<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
            auth_token: None,
        }
    }
}

/// Shared application state for every route handler.
pub struct AppState {
    pub started_at: Instant,
    pub config: HttpServerConfig,
    pub runtime: Arc<AgentRuntime>,
    pub discovery: Arc<Discovery>,
    pub transport: Arc<A2aClient>,
}

impl AppState {
    pub fn new(
        config: HttpServerConfig,
        runtime: Arc<AgentRuntime>,
        discovery: Arc<Discovery>,
        transport: Arc<A2aClient>,
    ) -> Self {
        Self { started_at: Instant::now(), config, runtime, discovery, transport }
    }
}

/// HTTP server exposing one agent's operational surface.
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    pub async fn run(&self) -> Result<()> {
        let mut app = create_app(self.state.clone());

        if self.config.enable_cors {
            let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
            app = app.layer(cors);
        }

        if self.config.enable_tracing {
            app = app.layer(TraceLayer::new_for_http());
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, cors = self.config.enable_cors, "agent transport listening");
        println!("Agent operational surface listening on http://{}", addr);
        println!("  Health:     http://{}/health", addr);
        println!("  Swagger UI: http://{}/swagger-ui", addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}
