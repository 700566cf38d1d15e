//! Security scheme types declared on the agent card.
//!
//! Follows the OpenAPI 3.0 Security Scheme Object shape. The server core
//! only declares these schemes; selection and credential injection is a
//! client-side interceptor concern.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::OAuthFlows;

/// A named set of scheme requirements, mapping scheme name to the scopes
/// the caller must hold.
pub type SecurityRequirement = HashMap<String, Vec<String>>;

/// Defines a security scheme that can be used to secure agent endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecurityScheme {
    /// API key security scheme.
    ApiKey(ApiKeySecurityScheme),
    /// HTTP authentication security scheme.
    Http(HttpAuthSecurityScheme),
    /// OAuth 2.0 security scheme.
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2SecurityScheme),
    /// OpenID Connect security scheme.
    OpenIdConnect(OpenIdConnectSecurityScheme),
}

/// The location of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// API key in a header.
    Header,
    /// API key in a query parameter.
    Query,
    /// API key in a cookie.
    Cookie,
}

/// Defines a security scheme using an API key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiKeySecurityScheme {
    /// The name of the header, query, or cookie parameter.
    pub name: String,
    /// The location of the API key.
    #[serde(rename = "in")]
    pub location: ApiKeyLocation,
    /// An optional description for the security scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiKeySecurityScheme {
    /// Creates a header-based API key scheme.
    pub fn header(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: ApiKeyLocation::Header,
            description: None,
        }
    }
}

/// Defines a security scheme using HTTP authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpAuthSecurityScheme {
    /// The name of the HTTP authentication scheme (e.g. "bearer").
    pub scheme: String,
    /// A hint to identify how the bearer token is formatted (e.g. "JWT").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    /// An optional description for the security scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HttpAuthSecurityScheme {
    /// Creates a bearer token authentication scheme.
    pub fn bearer() -> Self {
        Self {
            scheme: "bearer".to_string(),
            bearer_format: None,
            description: None,
        }
    }

    /// Creates a basic authentication scheme.
    pub fn basic() -> Self {
        Self {
            scheme: "basic".to_string(),
            bearer_format: None,
            description: None,
        }
    }
}

/// Defines a security scheme using OAuth 2.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuth2SecurityScheme {
    /// Configuration for the supported OAuth 2.0 flows.
    pub flows: OAuthFlows,
    /// An optional description for the security scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Defines a security scheme using OpenID Connect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenIdConnectSecurityScheme {
    /// The OpenID Connect Discovery URL.
    pub open_id_connect_url: String,
    /// An optional description for the security scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_scheme_serialization() {
        let scheme = SecurityScheme::ApiKey(ApiKeySecurityScheme::header("X-API-Key"));
        let json = serde_json::to_string(&scheme).unwrap();
        assert!(json.contains("\"type\":\"apiKey\""));
        assert!(json.contains("\"in\":\"header\""));
    }

    #[test]
    fn test_http_scheme_serialization() {
        let scheme = SecurityScheme::Http(HttpAuthSecurityScheme::bearer());
        let json = serde_json::to_string(&scheme).unwrap();
        assert!(json.contains("\"type\":\"http\""));
        assert!(json.contains("\"scheme\":\"bearer\""));
    }

    #[test]
    fn test_scheme_roundtrip() {
        let scheme = SecurityScheme::OpenIdConnect(OpenIdConnectSecurityScheme {
            open_id_connect_url: "https://issuer.example/.well-known/openid-configuration".into(),
            description: None,
        });
        let json = serde_json::to_string(&scheme).unwrap();
        let parsed: SecurityScheme = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scheme);
    }
}
