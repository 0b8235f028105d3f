//! Agent personality: response style and behavioral tuning carried by a template.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How an agent composed from a template should present itself and behave.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    /// Overall response style, e.g. "concise", "verbose", "socratic".
    #[serde(default)]
    pub response_style: Option<String>,

    /// Expertise level the agent should project: "novice", "practitioner", "expert".
    #[serde(default)]
    pub expertise_level: Option<String>,

    /// Whether the agent should state conclusions authoritatively or hedge.
    #[serde(default)]
    pub authoritative: bool,

    /// Whether the agent proactively suggests optimizations unprompted.
    #[serde(default)]
    pub proactive_optimization: bool,

    /// Free-form tone descriptors, e.g. "formal", "friendly".
    #[serde(default)]
    pub tone_profile: Vec<String>,

    /// Additional implementation-defined attributes.
    #[serde(default)]
    pub custom_attributes: HashMap<String, serde_json::Value>,
}

impl Personality {
    /// Merge `child` over `self` (the resolved parent), per §3 inheritance rules:
    /// scalars are child-wins-if-set, lists concatenate and dedupe, maps deep-merge.
    pub fn merged_with(&self, child: &Personality) -> Personality {
        let mut tone_profile = self.tone_profile.clone();
        for tone in &child.tone_profile {
            if !tone_profile.contains(tone) {
                tone_profile.push(tone.clone());
            }
        }

        let mut custom_attributes = self.custom_attributes.clone();
        for (k, v) in &child.custom_attributes {
            custom_attributes.insert(k.clone(), v.clone());
        }

        Personality {
            response_style: child.response_style.clone().or_else(|| self.response_style.clone()),
            expertise_level: child.expertise_level.clone().or_else(|| self.expertise_level.clone()),
            authoritative: child.authoritative || self.authoritative,
            proactive_optimization: child.proactive_optimization || self.proactive_optimization,
            tone_profile,
            custom_attributes,
        }
    }
}
