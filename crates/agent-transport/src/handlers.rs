//! HTTP handlers for the agent operational surface and the inbound A2A
//! message endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use crate::middleware::AppError;
use crate::runtime::{AgentError, AgentState};
use crate::server::AppState;
use crate::types::{
    A2aMessage, ApiError, HealthResponse, MessageType, Payload, ReloadResponse, SkillHealth, SkillResponsePayload,
    VersionResponse,
};

/// `GET /health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let agent_state = state.runtime.state().await;
    let overall = match agent_state {
        AgentState::Ready => "healthy",
        AgentState::Degraded => "degraded",
        AgentState::Initializing => "initializing",
        AgentState::Draining => "draining",
        AgentState::Stopped => "stopped",
    };

    let per_skill = state.runtime.skill_health().await;
    let mut skills = HashMap::with_capacity(per_skill.len().max(1));
    if per_skill.is_empty() {
        // No skills loaded (e.g. an agent serving no template yet); mirror
        // the aggregate state under the agent's own name so the response
        // shape is never an empty map.
        skills.insert(
            state.runtime.identity().name.clone(),
            SkillHealth {
                healthy: matches!(agent_state, AgentState::Ready),
                status: overall.to_string(),
                metrics: HashMap::new(),
                warnings: Vec::new(),
                errors: Vec::new(),
            },
        );
    } else {
        for (name, health) in per_skill {
            let status = match health {
                agent_runtime::HealthState::Healthy => "healthy",
                agent_runtime::HealthState::Degraded => "degraded",
                agent_runtime::HealthState::Failed => "failed",
                agent_runtime::HealthState::Disposing => "disposing",
                agent_runtime::HealthState::Initializing | agent_runtime::HealthState::Uninitialized => {
                    "initializing"
                }
            };
            skills.insert(
                name,
                SkillHealth {
                    healthy: matches!(health, agent_runtime::HealthState::Healthy),
                    status: status.to_string(),
                    metrics: HashMap::new(),
                    warnings: Vec::new(),
                    errors: Vec::new(),
                },
            );
        }
    }

    Json(HealthResponse { overall: overall.to_string(), skills })
}

/// `POST /skills/{name}/reload`
pub async fn reload_skill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<ReloadResponse>, AppError> {
    authenticate(&state, &headers)?;

    info!(skill = %name, "reload requested");
    match state.runtime.reload_skill(&name).await {
        Ok(()) => Ok(Json(ReloadResponse { skill: name, success: true, error: None })),
        Err(e) => Ok(Json(ReloadResponse { skill: name, success: false, error: Some(e.message) })),
    }
}

/// `GET /discovery`
pub async fn discovery_info(State(state): State<Arc<AppState>>) -> Json<crate::types::AgentIdentity> {
    Json(state.runtime.identity().clone())
}

/// `GET /version`
pub async fn version_info() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: option_env!("BUILD_DATE").map(String::from),
        commit: option_env!("GIT_COMMIT").map(String::from),
        rust_version: option_env!("RUST_VERSION").map(String::from),
        wasmtime_version: "26.0".to_string(),
    })
}

/// `POST /a2a/messages`: the inbound side of the A2A transport. Only
/// `skill/request` is dispatched synchronously; capability advertisements
/// invalidate the discovery cache; everything else is acknowledged.
pub async fn receive_a2a_message(State(state): State<Arc<AppState>>, Json(message): Json<A2aMessage>) -> impl IntoResponse {
    match message.message_type {
        MessageType::Request if message.payload.content_type == "skill/request" => {
            let request: crate::types::SkillRequestPayload =
                match serde_json::from_value(message.payload.content.clone()) {
                    Ok(r) => r,
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ApiError::new("ProtocolError", format!("malformed skill/request payload: {e}"))),
                        )
                            .into_response()
                    }
                };

            let response = state
                .runtime
                .execute(crate::runtime::ExecuteRequest {
                    target_agent: Some(state.runtime.identity().id.clone()),
                    skill: request.skill_name,
                    operation: request.operation,
                    parameters: request.parameters,
                    context: request.context,
                    workflow: None,
                })
                .await;

            let payload = SkillResponsePayload {
                success: response.success,
                data: response.data,
                error: response.error.as_ref().map(|e: &AgentError| e.message.clone()),
                warnings: Vec::new(),
            };

            let reply = A2aMessage {
                id: uuid::Uuid::new_v4().to_string(),
                message_type: MessageType::Response,
                from: state.runtime.identity().clone(),
                to: message.from,
                conversation_id: message.conversation_id,
                priority: message.priority,
                time_to_live_seconds: None,
                payload: Payload { content_type: "skill/response".to_string(), content: serde_json::json!(payload) },
            };

            (StatusCode::OK, Json(reply)).into_response()
        }
        MessageType::Notification | MessageType::Capability | MessageType::Heartbeat => {
            if message.payload.content_type == "capability/advertisement" {
                state.discovery.invalidate().await;
            }
            StatusCode::ACCEPTED.into_response()
        }
        other => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("ProtocolError", format!("unsupported message type for this endpoint: {other:?}"))),
        )
            .into_response(),
    }
}

/// Fallback handler for unmatched routes.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiError::new("NotFound", "endpoint not found")))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = &state.config.auth_token else { return Ok(()) };
    let provided = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::new(StatusCode::UNAUTHORIZED, ApiError::new("Unauthorized", "missing or invalid bearer token"))),
    }
}
