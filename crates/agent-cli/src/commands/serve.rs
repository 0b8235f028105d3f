use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_runtime::{compose, ConfigSchema, FunctionDispatcher, PluginEngine, PluginHost, SkillRegistry};
use agent_templates::TemplateStore;
use agent_transport::{A2aClient, A2aClientConfig, AgentIdentity, AgentRuntime, AppState, Discovery, HttpServer, HttpServerConfig};
use anyhow::{Context, Result};
use colored::*;

use crate::config::{AgentConfig, SecurityMode};

/// Boot an agent: compose its template (if any) into a running
/// [`PluginHost`], wire up the A2A transport and discovery, and serve the
/// operational HTTP surface until interrupted.
pub async fn execute(config: AgentConfig) -> Result<()> {
    println!("{} Composing agent '{}'...", "→".cyan(), config.agent_name.bold());

    let engine = Arc::new(PluginEngine::new().context("failed to initialize the WASM engine")?);
    let dispatcher = Arc::new(FunctionDispatcher::new());
    let host = Arc::new(PluginHost::new(engine, dispatcher.clone()));

    let composition_entries = if let Some(template_dir) = &config.template_dir {
        let store = TemplateStore::load(template_dir)
            .with_context(|| format!("loading template tree at {}", template_dir))?;
        let template_name = config.template_name.as_deref().unwrap_or(&config.agent_name);
        let template = store
            .resolve(template_name)
            .with_context(|| format!("resolving template '{}'", template_name))?;

        let registry = SkillRegistry::new();
        let schemas: HashMap<String, ConfigSchema> = HashMap::new();
        let environment: HashMap<String, HashMap<String, serde_json::Value>> = HashMap::new();
        let plan = compose(&template, &environment, &registry, &schemas)
            .await
            .context("composing template into a load plan")?;

        println!("{} Loading {} skill(s)...", "→".cyan(), plan.entries.len());
        host.load_plan(&plan.entries, &config.agent_name).await?;
        plan.entries
    } else {
        println!("{} No template configured; serving an empty agent", "ℹ".blue());
        Vec::new()
    };

    let endpoint = format!("http://{}:{}", config.host, config.port);
    let identity = AgentIdentity {
        id: uuid::Uuid::new_v4().to_string(),
        name: config.agent_name.clone(),
        agent_type: config.agent_type.clone(),
        version: "1.0.0".to_string(),
        capabilities: Vec::new(),
        endpoint,
    };

    let client_config = A2aClientConfig {
        default_timeout: Duration::from_secs(config.default_timeout_seconds),
        max_retries: config.max_retries,
        retry_delay: Duration::from_millis(config.retry_delay_ms),
        circuit_failure_threshold: config.circuit_open_threshold,
        circuit_cooldown: Duration::from_millis(config.circuit_cooldown_ms),
        max_in_flight_per_destination: config.max_in_flight_per_destination,
        max_queued_per_destination: config.max_queued_per_destination,
    };
    let transport = Arc::new(A2aClient::new(client_config));
    let discovery = Arc::new(Discovery::new(
        identity.clone(),
        config.registry_endpoint.clone(),
        config.known_agents.clone(),
        transport.clone(),
    ));

    let runtime = Arc::new(AgentRuntime::new(identity, dispatcher, host, discovery.clone(), transport.clone()));
    runtime.set_composition_plan(composition_entries, config.agent_name.clone()).await;
    runtime.mark_ready().await;

    let auth_token = match config.security_mode {
        SecurityMode::Bearer => config.auth_token.clone(),
        SecurityMode::Mtls | SecurityMode::None => None,
    };

    let server_config = HttpServerConfig {
        host: config.host.clone(),
        port: config.port,
        enable_cors: true,
        enable_tracing: true,
        auth_token,
    };

    let state = Arc::new(AppState::new(server_config.clone(), runtime, discovery, transport));
    let server = HttpServer::new(server_config, state);

    println!("{} Agent ready", "✓".green().bold());
    server.run().await
}
