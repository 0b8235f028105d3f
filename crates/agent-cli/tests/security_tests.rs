//! Security-relevant behavior: secret redaction in `config show`, and bearer
//! auth enforcement on the reload endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_runtime::{FunctionDispatcher, PluginEngine, PluginHost};
use agent_transport::{A2aClient, A2aClientConfig, AgentIdentity, AgentRuntime, AppState, Discovery, HttpServer, HttpServerConfig};
use assert_cmd::Command;
use tempfile::TempDir;

#[test]
fn test_config_set_secret_is_redacted_on_show() {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("agent")
        .unwrap()
        .env("HOME", temp.path())
        .args(["config", "demo-skill", "set", "api_token=sk-secret-value-12345"])
        .assert();

    let result = Command::cargo_bin("agent")
        .unwrap()
        .env("HOME", temp.path())
        .args(["config", "demo-skill", "show"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&result.get_output().stdout);
    assert!(!stdout.contains("sk-secret-value-12345"), "secret value leaked in config show output");
    assert!(stdout.contains("REDACTED"), "secret field should render as REDACTED");
}

async fn spawn_test_agent(port: u16, auth_token: Option<String>) {
    let engine = Arc::new(PluginEngine::new().unwrap());
    let dispatcher = Arc::new(FunctionDispatcher::new());
    let host = Arc::new(PluginHost::new(engine, dispatcher.clone()));

    let identity = AgentIdentity {
        id: "test-agent".to_string(),
        name: "test-agent".to_string(),
        agent_type: "generic".to_string(),
        version: "1.0.0".to_string(),
        capabilities: Vec::new(),
        endpoint: format!("http://127.0.0.1:{}", port),
    };

    let transport = Arc::new(A2aClient::new(A2aClientConfig::default()));
    let discovery = Arc::new(Discovery::new(identity.clone(), None, HashMap::new(), transport.clone()));
    let runtime = Arc::new(AgentRuntime::new(identity, dispatcher, host, discovery.clone(), transport.clone()));
    runtime.mark_ready().await;

    let config = HttpServerConfig { host: "127.0.0.1".to_string(), port, enable_cors: false, enable_tracing: false, auth_token };
    let state = Arc::new(AppState::new(config.clone(), runtime, discovery, transport));
    let server = HttpServer::new(config, state);

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // give the listener a moment to bind
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_reload_without_bearer_token_is_rejected() {
    spawn_test_agent(38901, Some("expected-token".to_string())).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:38901/skills/demo/reload")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reload_with_correct_bearer_token_is_accepted() {
    spawn_test_agent(38902, Some("expected-token".to_string())).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:38902/skills/demo/reload")
        .bearer_auth("expected-token")
        .send()
        .await
        .unwrap();

    assert_ne!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
