//! Layered configuration for the operator binary: built-in defaults, an
//! optional `agent-runtime.toml` discovered by walking up from the working
//! directory, environment variables under an `AGENT_` prefix, and finally
//! whatever the caller's CLI flags override.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Agent-wide configuration, merged from file, environment, and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub agent_name: String,
    pub agent_type: String,
    pub host: String,
    pub port: u16,
    pub default_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub circuit_open_threshold: u32,
    pub circuit_cooldown_ms: u64,
    pub max_in_flight_per_destination: usize,
    pub max_queued_per_destination: usize,
    pub max_parallel_steps: usize,
    pub hot_reload_enabled: bool,
    pub security_mode: SecurityMode,
    pub auth_token: Option<String>,
    pub known_agents: HashMap<String, String>,
    pub registry_endpoint: Option<String>,
    /// Directory holding the template tree, passed to `TemplateStore::load`.
    pub template_dir: Option<String>,
    /// Name of the template to resolve out of `template_dir`. Defaults to
    /// `agent_name` when unset.
    pub template_name: Option<String>,
}

/// Authentication scheme guarding the operational surface's mutating routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    Bearer,
    Mtls,
    None,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "agent".to_string(),
            agent_type: "generic".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            default_timeout_seconds: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
            circuit_open_threshold: 5,
            circuit_cooldown_ms: 30_000,
            max_in_flight_per_destination: 64,
            max_queued_per_destination: 256,
            max_parallel_steps: 8,
            hot_reload_enabled: true,
            security_mode: SecurityMode::None,
            auth_token: None,
            known_agents: HashMap::new(),
            registry_endpoint: None,
            template_dir: None,
            template_name: None,
        }
    }
}

impl AgentConfig {
    /// Build the layered config: defaults, then `agent-runtime.toml` (found by
    /// walking up from `start_dir`), then `AGENT_*` environment overrides.
    pub fn load(start_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = find_config_file(start_dir) {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            config = toml::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AGENT_NAME") {
            self.agent_name = v;
        }
        if let Ok(v) = std::env::var("AGENT_HOST") {
            self.host = v;
        }
        if let Ok(v) = std::env::var("AGENT_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("AGENT_AUTH_TOKEN") {
            self.auth_token = Some(v);
        }
        if let Ok(v) = std::env::var("AGENT_SECURITY_MODE") {
            self.security_mode = match v.to_lowercase().as_str() {
                "bearer" => SecurityMode::Bearer,
                "mtls" => SecurityMode::Mtls,
                _ => SecurityMode::None,
            };
        }
        if let Ok(v) = std::env::var("AGENT_HOT_RELOAD_ENABLED") {
            if let Ok(b) = v.parse() {
                self.hot_reload_enabled = b;
            }
        }
    }
}

/// Walk up from `dir` looking for `agent-runtime.toml`, mirroring the
/// teacher's manifest discovery.
fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let mut current = dir.to_path_buf();
    loop {
        let candidate = current.join("agent-runtime.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
