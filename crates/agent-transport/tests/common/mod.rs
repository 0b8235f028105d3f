//! Common test utilities for the operational surface's in-process integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use agent_runtime::{FunctionDispatcher, PluginEngine, PluginHost};
use agent_transport::routes::create_app;
use agent_transport::{A2aClient, A2aClientConfig, AgentIdentity, AgentRuntime, AppState, Discovery, HttpServerConfig};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_auth_token(None).await
    }

    pub async fn with_auth_token(auth_token: Option<String>) -> Self {
        let engine = Arc::new(PluginEngine::new().expect("wasmtime engine init"));
        let dispatcher = Arc::new(FunctionDispatcher::new());
        let host = Arc::new(PluginHost::new(engine, dispatcher.clone()));

        let identity = AgentIdentity {
            id: "test-agent".to_string(),
            name: "test-agent".to_string(),
            agent_type: "generic".to_string(),
            version: "1.0.0".to_string(),
            capabilities: vec!["demo".to_string()],
            endpoint: "http://127.0.0.1:0".to_string(),
        };

        let transport = Arc::new(A2aClient::new(A2aClientConfig::default()));
        let discovery = Arc::new(Discovery::new(identity.clone(), None, HashMap::new(), transport.clone()));
        let runtime = Arc::new(AgentRuntime::new(identity, dispatcher, host, discovery.clone(), transport.clone()));
        runtime.mark_ready().await;

        let config = HttpServerConfig { host: "127.0.0.1".to_string(), port: 0, enable_cors: false, enable_tracing: false, auth_token };
        let state = Arc::new(AppState::new(config, runtime, discovery, transport));

        Self { app: create_app(state) }
    }

    pub async fn request(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    pub fn get(path: &str) -> Request<Body> {
        Request::builder().method("GET").uri(path).body(Body::empty()).unwrap()
    }

    pub fn post_json(path: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }
}
