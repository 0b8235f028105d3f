//! OpenAPI specification generation for the agent operational surface.

use utoipa::OpenApi;

use crate::types::*;

/// OpenAPI documentation for the agent operational surface and the A2A
/// wire format.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agent Runtime API",
        version = "1.0.0",
        description = "Operational surface and A2A transport for a running agent",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "Agent Platform", url = "https://github.com/kubiyabot/skill")
    ),
    servers((url = "http://localhost:3000", description = "Local agent")),
    components(
        schemas(
            AgentIdentity,
            MessageType,
            Priority,
            Payload,
            A2aMessage,
            SkillRequestPayload,
            SkillResponsePayload,
            DiscoveryQueryKind,
            DiscoveryRequestPayload,
            DiscoveryResponsePayload,
            SkillHealth,
            HealthResponse,
            VersionResponse,
            ReloadResponse,
            ApiError,
        )
    ),
    tags(
        (name = "operations", description = "Health, reload, discovery, and version"),
        (name = "a2a", description = "Inbound agent-to-agent messaging"),
    )
)]
pub struct ApiDoc;
