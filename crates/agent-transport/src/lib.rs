//! Agent Transport: A2A messaging, discovery, the Agent Runtime façade, and
//! the HTTP operational surface built on top of them.
//!
//! ## API Endpoints
//!
//! - `GET /health` - aggregate + per-skill health
//! - `POST /skills/{name}/reload` - authenticated hot-reload trigger
//! - `GET /discovery` - local agent identity
//! - `GET /version` - build/version metadata
//! - `POST /a2a/messages` - inbound A2A envelope (the receive side of §4.6)
//! - `GET /swagger-ui`, `GET /api-docs/openapi.json` - OpenAPI documentation
//!
//! ## Example
//!
//! ```ignore
//! use agent_transport::{HttpServer, HttpServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HttpServerConfig::default();
//!     // ... build an AppState around an AgentRuntime, then:
//!     // HttpServer::new(config, state).run().await
//!     Ok(())
//! }
//! ```

pub mod circuit;
pub mod client;
pub mod discovery;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod runtime;
pub mod server;
pub mod types;

pub use circuit::CircuitBreaker;
pub use client::{A2aClient, A2aClientConfig};
pub use discovery::Discovery;
pub use errors::{Result, TransportError};
pub use runtime::{AgentError, AgentRuntime, AgentState, ExecuteRequest, ExecuteResponse, RuntimeStepDispatcher};
pub use server::{AppState, HttpServer, HttpServerConfig};
pub use types::*;
