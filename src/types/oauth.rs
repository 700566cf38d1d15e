//! OAuth 2.0 flow configuration for security schemes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Defines the configuration for the supported OAuth 2.0 flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OAuthFlows {
    /// Configuration for the OAuth Authorization Code flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<AuthorizationCodeOAuthFlow>,
    /// Configuration for the OAuth Client Credentials flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<ClientCredentialsOAuthFlow>,
    /// Configuration for the OAuth Implicit flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<ImplicitOAuthFlow>,
    /// Configuration for the OAuth Resource Owner Password flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<PasswordOAuthFlow>,
}

impl OAuthFlows {
    /// Creates flows with only an authorization code configuration.
    pub fn authorization_code(flow: AuthorizationCodeOAuthFlow) -> Self {
        Self {
            authorization_code: Some(flow),
            ..Default::default()
        }
    }

    /// Creates flows with only a client credentials configuration.
    pub fn client_credentials(flow: ClientCredentialsOAuthFlow) -> Self {
        Self {
            client_credentials: Some(flow),
            ..Default::default()
        }
    }
}

/// Configuration for the OAuth 2.0 Authorization Code flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationCodeOAuthFlow {
    /// The authorization URL to be used for this flow.
    pub authorization_url: String,
    /// The token URL to be used for this flow.
    pub token_url: String,
    /// The available scopes for the OAuth2 security scheme.
    pub scopes: HashMap<String, String>,
    /// The URL to be used for obtaining refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
}

/// Configuration for the OAuth 2.0 Client Credentials flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientCredentialsOAuthFlow {
    /// The token URL to be used for this flow.
    pub token_url: String,
    /// The available scopes for the OAuth2 security scheme.
    pub scopes: HashMap<String, String>,
    /// The URL to be used for obtaining refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
}

/// Configuration for the OAuth 2.0 Implicit flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImplicitOAuthFlow {
    /// The authorization URL to be used for this flow.
    pub authorization_url: String,
    /// The available scopes for the OAuth2 security scheme.
    pub scopes: HashMap<String, String>,
    /// The URL to be used for obtaining refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
}

/// Configuration for the OAuth 2.0 Resource Owner Password flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PasswordOAuthFlow {
    /// The token URL to be used for this flow.
    pub token_url: String,
    /// The available scopes for the OAuth2 security scheme.
    pub scopes: HashMap<String, String>,
    /// The URL to be used for obtaining refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
}
