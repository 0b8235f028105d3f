//! Discovery: resolves agent identities by id, name, type, or capability,
//! backed by a registry service plus a local static seed, cached with a TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::A2aClient;
use crate::errors::{Result, TransportError};
use crate::types::{
    A2aMessage, AgentIdentity, DiscoveryQueryKind, DiscoveryRequestPayload, DiscoveryResponsePayload, MessageType,
    Payload, Priority,
};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    agents: Arc<HashMap<String, AgentIdentity>>,
    fetched_at: Instant,
}

/// Resolves and caches remote agent identities.
pub struct Discovery {
    self_identity: AgentIdentity,
    registry_endpoint: Option<String>,
    known_agents: HashMap<String, String>,
    client: Arc<A2aClient>,
    cache: RwLock<Option<CacheEntry>>,
    ttl: Duration,
}

impl Discovery {
    pub fn new(
        self_identity: AgentIdentity,
        registry_endpoint: Option<String>,
        known_agents: HashMap<String, String>,
        client: Arc<A2aClient>,
    ) -> Self {
        Self { self_identity, registry_endpoint, known_agents, client, cache: RwLock::new(None), ttl: DEFAULT_CACHE_TTL }
    }

    /// Drop the cached snapshot — called after receiving a fresh capability
    /// advertisement, so the next query re-fetches.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    pub async fn find_by_id(&self, id: &str) -> Result<AgentIdentity> {
        let snapshot = self.snapshot().await?;
        snapshot.get(id).cloned().ok_or_else(|| TransportError::TargetUnknown(id.to_string()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<AgentIdentity> {
        let snapshot = self.snapshot().await?;
        snapshot
            .values()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| TransportError::TargetUnknown(name.to_string()))
    }

    pub async fn find_by_type(&self, agent_type: &str) -> Result<Vec<AgentIdentity>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.values().filter(|a| a.agent_type == agent_type).cloned().collect())
    }

    pub async fn find_by_capability(&self, capability: &str) -> Result<Vec<AgentIdentity>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .values()
            .filter(|a| a.capabilities.iter().any(|c| c == capability))
            .cloned()
            .collect())
    }

    pub async fn all(&self) -> Result<Vec<AgentIdentity>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.values().cloned().collect())
    }

    /// Returns the cached agent map, refreshing it from the registry (and
    /// merging in the static seed) if the TTL has lapsed.
    async fn snapshot(&self) -> Result<Arc<HashMap<String, AgentIdentity>>> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.as_ref() {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.agents.clone());
                }
            }
        }

        let mut agents = self.seed_agents();
        if let Some(endpoint) = &self.registry_endpoint {
            match self.query_registry(endpoint, DiscoveryQueryKind::All, None).await {
                Ok(fetched) => {
                    for agent in fetched {
                        agents.insert(agent.id.clone(), agent);
                    }
                }
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "discovery registry query failed, using seed only");
                }
            }
        }

        let agents = Arc::new(agents);
        *self.cache.write().await = Some(CacheEntry { agents: agents.clone(), fetched_at: Instant::now() });
        Ok(agents)
    }

    fn seed_agents(&self) -> HashMap<String, AgentIdentity> {
        self.known_agents
            .iter()
            .map(|(id, endpoint)| {
                (
                    id.clone(),
                    AgentIdentity {
                        id: id.clone(),
                        name: id.clone(),
                        agent_type: "unknown".to_string(),
                        version: "0.0.0".to_string(),
                        capabilities: Vec::new(),
                        endpoint: endpoint.clone(),
                    },
                )
            })
            .collect()
    }

    async fn query_registry(
        &self,
        endpoint: &str,
        query_type: DiscoveryQueryKind,
        criteria: Option<String>,
    ) -> Result<Vec<AgentIdentity>> {
        let message = A2aMessage {
            id: Uuid::new_v4().to_string(),
            message_type: MessageType::Discovery,
            from: self.self_identity.clone(),
            to: AgentIdentity {
                id: "registry".to_string(),
                name: "registry".to_string(),
                agent_type: "registry".to_string(),
                version: "0.0.0".to_string(),
                capabilities: Vec::new(),
                endpoint: endpoint.to_string(),
            },
            conversation_id: None,
            priority: Priority::Normal,
            time_to_live_seconds: Some(10),
            payload: Payload {
                content_type: "discovery/request".to_string(),
                content: json!(DiscoveryRequestPayload { query_type, criteria, include_capabilities: true }),
            },
        };

        let response = self.client.send_request(endpoint, &message).await?;
        let payload: DiscoveryResponsePayload = serde_json::from_value(response.payload.content)
            .map_err(|e| TransportError::ProtocolError(endpoint.to_string(), e.to_string()))?;
        Ok(payload.agents)
    }

    /// Advertise this agent's identity to the registry, called at startup
    /// and on every capability change.
    pub async fn advertise_self(&self) -> Result<()> {
        let Some(endpoint) = &self.registry_endpoint else { return Ok(()) };
        let message = A2aMessage {
            id: Uuid::new_v4().to_string(),
            message_type: MessageType::Capability,
            from: self.self_identity.clone(),
            to: AgentIdentity {
                id: "registry".to_string(),
                name: "registry".to_string(),
                agent_type: "registry".to_string(),
                version: "0.0.0".to_string(),
                capabilities: Vec::new(),
                endpoint: endpoint.clone(),
            },
            conversation_id: None,
            priority: Priority::Normal,
            time_to_live_seconds: Some(10),
            payload: Payload { content_type: "capability/advertisement".to_string(), content: json!(self.self_identity) },
        };
        self.client.send_notification(endpoint, &message).await
    }
}
