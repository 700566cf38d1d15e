//! Agent card and capability types.
//!
//! The agent card is a self-describing manifest providing identity,
//! capabilities, skills, and security requirements for an agent. It is
//! served on the well-known endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{SecurityRequirement, SecurityScheme};

/// The agent card is a self-describing manifest for an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    /// A human-readable name for the agent.
    pub name: String,
    /// A human-readable description of the agent.
    pub description: String,
    /// The preferred endpoint URL for interacting with the agent.
    pub url: String,
    /// The agent's own version number.
    pub version: String,
    /// Default set of supported input MIME types.
    pub default_input_modes: Vec<String>,
    /// Default set of supported output MIME types.
    pub default_output_modes: Vec<String>,
    /// A declaration of optional capabilities supported by the agent.
    pub capabilities: AgentCapabilities,
    /// The set of skills the agent can perform.
    pub skills: Vec<AgentSkill>,
    /// Information about the agent's service provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,
    /// An optional URL to the agent's documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    /// A declaration of the security schemes available, by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<HashMap<String, SecurityScheme>>,
    /// A list of security requirement alternatives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

impl AgentCard {
    /// Creates a new agent card builder.
    pub fn builder(name: impl Into<String>, url: impl Into<String>) -> AgentCardBuilder {
        AgentCardBuilder::new(name, url)
    }

    /// Returns true if the agent supports streaming.
    pub fn supports_streaming(&self) -> bool {
        self.capabilities.streaming.unwrap_or(false)
    }

    /// Returns true if the agent supports push notifications.
    pub fn supports_push_notifications(&self) -> bool {
        self.capabilities.push_notifications.unwrap_or(false)
    }

    /// Finds a skill by its ID.
    pub fn find_skill(&self, skill_id: &str) -> Option<&AgentSkill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }
}

/// Builder for creating an [`AgentCard`].
#[derive(Debug)]
pub struct AgentCardBuilder {
    card: AgentCard,
}

impl AgentCardBuilder {
    /// Creates a new builder with required fields.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            card: AgentCard {
                name: name.into(),
                description: String::new(),
                url: url.into(),
                version: "1.0.0".to_string(),
                default_input_modes: vec!["text/plain".to_string()],
                default_output_modes: vec!["text/plain".to_string()],
                capabilities: AgentCapabilities::default(),
                skills: vec![],
                provider: None,
                documentation_url: None,
                security_schemes: None,
                security: None,
            },
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.card.description = description.into();
        self
    }

    /// Sets the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.card.version = version.into();
        self
    }

    /// Sets the capabilities.
    pub fn capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.card.capabilities = capabilities;
        self
    }

    /// Adds a skill.
    pub fn skill(mut self, skill: AgentSkill) -> Self {
        self.card.skills.push(skill);
        self
    }

    /// Sets the input modes.
    pub fn input_modes(mut self, modes: Vec<String>) -> Self {
        self.card.default_input_modes = modes;
        self
    }

    /// Sets the output modes.
    pub fn output_modes(mut self, modes: Vec<String>) -> Self {
        self.card.default_output_modes = modes;
        self
    }

    /// Sets the provider.
    pub fn provider(mut self, provider: AgentProvider) -> Self {
        self.card.provider = Some(provider);
        self
    }

    /// Declares a named security scheme.
    pub fn security_scheme(mut self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.card
            .security_schemes
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), scheme);
        self
    }

    /// Adds a security requirement alternative.
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.card
            .security
            .get_or_insert_with(Vec::new)
            .push(requirement);
        self
    }

    /// Builds the agent card.
    pub fn build(self) -> AgentCard {
        self.card
    }
}

/// Defines optional capabilities supported by an agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentCapabilities {
    /// Indicates if the agent supports SSE streaming responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    /// Indicates if the agent supports push notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    /// Indicates if the agent exposes task state transition history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_transition_history: Option<bool>,
}

/// A distinct capability or function the agent can perform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSkill {
    /// A unique identifier for the skill.
    pub id: String,
    /// A human-readable name for the skill.
    pub name: String,
    /// A description of what the skill does.
    pub description: String,
    /// Keywords describing the skill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Example prompts or use cases for the skill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    /// Input MIME types supported by this skill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,
    /// Output MIME types produced by this skill.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
}

impl AgentSkill {
    /// Creates a new skill with the required fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: None,
            examples: None,
            input_modes: None,
            output_modes: None,
        }
    }
}

/// Information about the organization providing the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProvider {
    /// The name of the provider organization.
    pub organization: String,
    /// A URL for the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiKeySecurityScheme, SecurityScheme};

    #[test]
    fn test_card_builder() {
        let card = AgentCard::builder("Echo Agent", "http://localhost:8080")
            .description("Echoes whatever it hears")
            .capabilities(AgentCapabilities {
                streaming: Some(true),
                ..Default::default()
            })
            .skill(AgentSkill::new("echo", "Echo", "Repeats the input"))
            .security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKeySecurityScheme::header("X-API-Key")),
            )
            .build();

        assert!(card.supports_streaming());
        assert!(!card.supports_push_notifications());
        assert!(card.find_skill("echo").is_some());
        assert!(card.security_schemes.unwrap().contains_key("api_key"));
    }

    #[test]
    fn test_card_serialization() {
        let card = AgentCard::builder("A", "http://a").build();
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"default_input_modes\""));
        let parsed: AgentCard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "A");
    }
}
