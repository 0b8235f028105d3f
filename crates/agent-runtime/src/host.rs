//! Plugin Host: loads composed skills in dependency order, supervises their
//! health, and performs hot-reload.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::composer::CompositionEntry;
use crate::dispatcher::FunctionDispatcher;
use crate::engine::PluginEngine;
use crate::errors::{Result, RuntimeError};
use crate::executor::SkillExecutor;
use crate::instance::{Capabilities, ConfigValue, InstanceConfig, InstanceMetadata};
use crate::types::HealthState;

const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// A skill instance the host has loaded and is supervising.
struct LoadedSkill {
    executor: Arc<SkillExecutor>,
    health: RwLock<HealthState>,
}

/// Orchestrates isolated load, init, dispatch wiring, health, and hot-reload
/// for every skill in a composed agent.
pub struct PluginHost {
    engine: Arc<PluginEngine>,
    dispatcher: Arc<FunctionDispatcher>,
    skills: RwLock<HashMap<String, Arc<LoadedSkill>>>,
    init_timeout: Duration,
}

impl PluginHost {
    /// Create a host over a shared [`PluginEngine`] and [`FunctionDispatcher`].
    pub fn new(engine: Arc<PluginEngine>, dispatcher: Arc<FunctionDispatcher>) -> Self {
        Self {
            engine,
            dispatcher,
            skills: RwLock::new(HashMap::new()),
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }

    /// Override the default 30s `Initialize` timeout.
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Load every entry of a [`crate::composer::CompositionPlan`] in the
    /// order given — callers are expected to have already topologically
    /// sorted the plan's entries.
    pub async fn load_plan(&self, entries: &[CompositionEntry], instance_name: &str) -> Result<()> {
        for entry in entries {
            self.load_skill(entry, instance_name).await?;
        }
        Ok(())
    }

    async fn load_skill(&self, entry: &CompositionEntry, instance_name: &str) -> Result<()> {
        let skill_name = entry.implementation.metadata.name.clone();

        let instance_config = InstanceConfig {
            metadata: InstanceMetadata {
                skill_name: skill_name.clone(),
                skill_version: entry.implementation.metadata.version.clone(),
                instance_name: instance_name.to_string(),
                ..InstanceMetadata::default()
            },
            config: entry
                .effective_config
                .iter()
                .map(|(k, v)| {
                    let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), ConfigValue { value, secret: false })
                })
                .collect(),
            environment: HashMap::new(),
            capabilities: Capabilities::default(),
        };

        let executor = SkillExecutor::load(
            self.engine.clone(),
            &entry.implementation.component_path,
            skill_name.clone(),
            instance_name.to_string(),
            instance_config,
        )
        .await
        .map_err(|e| RuntimeError::ComponentLoadError(e.to_string()))?;
        let executor = Arc::new(executor);

        match tokio::time::timeout(self.init_timeout, executor.initialize()).await {
            Err(_) => {
                return Err(RuntimeError::InitializationTimeout(skill_name, self.init_timeout));
            }
            Ok(Err(e)) => {
                return Err(RuntimeError::InitializationFailed(skill_name, e.to_string()));
            }
            Ok(Ok(())) => {}
        }

        let tools = executor
            .get_tools()
            .await
            .map_err(|e| RuntimeError::ComponentLoadError(e.to_string()))?;
        self.dispatcher
            .register_operations(&skill_name, executor.clone(), tools, entry.implementation.metadata.concurrency)
            .await;

        let loaded = Arc::new(LoadedSkill {
            executor,
            health: RwLock::new(HealthState::Healthy),
        });
        self.skills.write().await.insert(skill_name.clone(), loaded);

        tracing::info!(skill = %skill_name, instance = %instance_name, "Skill loaded and initialized");
        Ok(())
    }

    /// Run `GetHealth` against a loaded skill, caching the result.
    pub async fn health_check(&self, skill: &str) -> Result<HealthState> {
        let loaded = {
            let skills = self.skills.read().await;
            skills.get(skill).cloned()
        }
        .ok_or_else(|| RuntimeError::InstanceNotFound {
            skill: skill.to_string(),
            instance: String::new(),
        })?;

        let state = match loaded.executor.health_check().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(skill = %skill, error = %e, "health check failed");
                HealthState::Degraded
            }
        };

        *loaded.health.write().await = state;
        Ok(state)
    }

    /// Worst-case health across every loaded skill: any required skill
    /// `Failed` degrades the whole agent.
    pub async fn aggregate_health(&self) -> HealthState {
        let skills = self.skills.read().await;
        let mut worst = HealthState::Healthy;
        for loaded in skills.values() {
            worst = worse(worst, *loaded.health.read().await);
        }
        worst
    }

    /// Snapshot of every loaded skill's last-observed health, for surfacing
    /// a per-skill breakdown on the operational health endpoint.
    pub async fn health_snapshot(&self) -> HashMap<String, HealthState> {
        let skills = self.skills.read().await;
        let mut snapshot = HashMap::with_capacity(skills.len());
        for (name, loaded) in skills.iter() {
            snapshot.insert(name.clone(), *loaded.health.read().await);
        }
        snapshot
    }

    /// Hot-reload a single skill: quiesce, dispose, unload, reload, swap.
    /// On failure, the skill is left `Failed` — there is no previous handle
    /// to roll back to once the old component has been disposed.
    pub async fn hot_reload(&self, entry: &CompositionEntry, instance_name: &str) -> Result<()> {
        let skill_name = entry.implementation.metadata.name.clone();

        if let Some(loaded) = self.skills.read().await.get(&skill_name).cloned() {
            *loaded.health.write().await = HealthState::Disposing;
        }
        self.dispatcher.begin_reload(&skill_name).await;
        self.dispatcher.unregister_skill(&skill_name).await;

        if let Some(loaded) = self.skills.write().await.remove(&skill_name) {
            if let Err(e) = loaded.executor.dispose().await {
                tracing::warn!(skill = %skill_name, error = %e, "dispose failed during hot-reload");
            }
        }

        let result = self.load_skill(entry, instance_name).await;
        self.dispatcher.end_reload(&skill_name).await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(skill = %skill_name, error = %e, "hot-reload failed, skill left failed");
                Err(e)
            }
        }
    }
}

fn worse(a: HealthState, b: HealthState) -> HealthState {
    fn rank(s: HealthState) -> u8 {
        match s {
            HealthState::Healthy => 0,
            HealthState::Uninitialized => 1,
            HealthState::Initializing => 1,
            HealthState::Degraded => 2,
            HealthState::Disposing => 3,
            HealthState::Failed => 4,
        }
    }
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worse_prefers_failed_over_healthy() {
        assert_eq!(worse(HealthState::Healthy, HealthState::Failed), HealthState::Failed);
        assert_eq!(worse(HealthState::Degraded, HealthState::Healthy), HealthState::Degraded);
    }

    #[tokio::test]
    async fn aggregate_health_is_healthy_with_no_skills() {
        let engine = Arc::new(PluginEngine::new().unwrap());
        let dispatcher = Arc::new(FunctionDispatcher::new());
        let host = PluginHost::new(engine, dispatcher);
        assert_eq!(host.aggregate_health().await, HealthState::Healthy);
    }

    #[tokio::test]
    async fn health_check_reports_instance_not_found() {
        let engine = Arc::new(PluginEngine::new().unwrap());
        let dispatcher = Arc::new(FunctionDispatcher::new());
        let host = PluginHost::new(engine, dispatcher);
        let err = host.health_check("missing").await.unwrap_err();
        assert!(matches!(err, RuntimeError::InstanceNotFound { .. }));
    }
}
