//! Infrastructure demands a template places on the environment it runs in.

use serde::{Deserialize, Serialize};

/// A database or external service a composed agent requires access to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequirement {
    /// Logical name, e.g. "postgres", "redis".
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the agent can still boot without it (degraded).
    #[serde(default)]
    pub optional: bool,

    /// Default port, if applicable.
    #[serde(default)]
    pub default_port: Option<u16>,
}

/// Resource envelope requested for the composed agent's container/process.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Minimum memory, in megabytes.
    #[serde(default)]
    pub min_memory_mb: Option<u64>,
    /// Maximum memory, in megabytes.
    #[serde(default)]
    pub max_memory_mb: Option<u64>,
    /// Minimum CPU cores.
    #[serde(default)]
    pub min_cpu_cores: Option<f64>,
    /// Maximum CPU cores.
    #[serde(default)]
    pub max_cpu_cores: Option<f64>,
    /// Disk space, in megabytes.
    #[serde(default)]
    pub disk_space_mb: Option<u64>,
}

impl ResourceRequirements {
    /// Child wins per field when set, otherwise falls back to parent — same rule as
    /// the rest of template inheritance.
    pub fn merged_with(&self, child: &ResourceRequirements) -> ResourceRequirements {
        ResourceRequirements {
            min_memory_mb: child.min_memory_mb.or(self.min_memory_mb),
            max_memory_mb: child.max_memory_mb.or(self.max_memory_mb),
            min_cpu_cores: child.min_cpu_cores.or(self.min_cpu_cores),
            max_cpu_cores: child.max_cpu_cores.or(self.max_cpu_cores),
            disk_space_mb: child.disk_space_mb.or(self.disk_space_mb),
        }
    }
}

/// Infrastructure section of a template.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    /// Databases the composed agent needs reachable.
    #[serde(default)]
    pub databases: Vec<ServiceRequirement>,
    /// Auxiliary services (queues, caches, search indexes, ...).
    #[serde(default)]
    pub services: Vec<ServiceRequirement>,
    /// Container images the Plugin Host may need to pull for non-WASM skills.
    #[serde(default)]
    pub container_images: Vec<String>,
    /// Resource envelope.
    #[serde(default)]
    pub resources: ResourceRequirements,
}

fn merge_services(parent: &[ServiceRequirement], child: &[ServiceRequirement]) -> Vec<ServiceRequirement> {
    let mut merged: Vec<ServiceRequirement> = parent.to_vec();
    for svc in child {
        if let Some(existing) = merged.iter_mut().find(|s| s.name == svc.name) {
            *existing = svc.clone();
        } else {
            merged.push(svc.clone());
        }
    }
    merged
}

impl Infrastructure {
    /// Merge `child` over `self`.
    pub fn merged_with(&self, child: &Infrastructure) -> Infrastructure {
        let mut container_images = self.container_images.clone();
        for img in &child.container_images {
            if !container_images.contains(img) {
                container_images.push(img.clone());
            }
        }
        Infrastructure {
            databases: merge_services(&self.databases, &child.databases),
            services: merge_services(&self.services, &child.services),
            container_images,
            resources: self.resources.merged_with(&child.resources),
        }
    }
}
