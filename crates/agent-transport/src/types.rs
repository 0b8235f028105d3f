//! A2A wire format and operational surface response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Identity an agent advertises about itself: who it is, what it can do,
/// and where to reach it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AgentIdentity {
    /// Unique agent id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Agent type/category, used by `ByType` discovery queries.
    #[serde(rename = "type")]
    pub agent_type: String,
    /// Semantic version of the agent's own template composition.
    pub version: String,
    /// Capability names this agent advertises.
    pub capabilities: Vec<String>,
    /// A2A endpoint URL to reach it at.
    pub endpoint: String,
}

/// The envelope's `type` field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Notification,
    Event,
    Heartbeat,
    Discovery,
    Capability,
    Error,
}

/// Delivery priority, highest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
    Emergency,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// The envelope's typed payload: a MIME-like content type tag plus the
/// actual JSON content, whose shape depends on `content_type`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payload {
    pub content_type: String,
    pub content: Value,
}

/// One A2A message, sent as the JSON body of `POST {endpoint}/a2a/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct A2aMessage {
    /// Unique message id, client-assigned for idempotency.
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub from: AgentIdentity,
    pub to: AgentIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_live_seconds: Option<u64>,
    pub payload: Payload,
}

/// `content_type: "skill/request"` payload body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkillRequestPayload {
    pub skill_name: String,
    pub operation: String,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    #[serde(default)]
    pub context: HashMap<String, Value>,
}

/// `content_type: "skill/response"` payload body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkillResponsePayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// The kind of lookup a `discovery/request` payload asks for.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryQueryKind {
    ById,
    ByName,
    ByType,
    ByCapability,
    All,
}

/// `content_type: "discovery/request"` payload body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscoveryRequestPayload {
    #[serde(rename = "type")]
    pub query_type: DiscoveryQueryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default)]
    pub include_capabilities: bool,
}

/// `content_type: "discovery/response"` payload body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscoveryResponsePayload {
    pub agents: Vec<AgentIdentity>,
}

/// Per-skill health as reported by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkillHealth {
    pub healthy: bool,
    pub status: String,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub overall: String,
    pub skills: HashMap<String, SkillHealth>,
}

/// `GET /version` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rust_version: Option<String>,
    pub wasmtime_version: String,
}

/// Response to `POST /skills/{name}/reload`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    pub skill: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The stable `{kind, message}` shape every error-returning endpoint uses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ApiError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: kind.into(), message: message.into(), cause: None }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}
