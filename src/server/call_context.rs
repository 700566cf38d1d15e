//! Per-request call context.
//!
//! A [`CallContext`] carries the authenticated user, request state, the
//! security requirement and scheme tables consulted by credential
//! interceptors, and the ambient cancellation signal. Its life equals
//! the request's lifetime; it is passed explicitly through every core
//! operation and never stashed in process-wide state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::types::{SecurityRequirement, SecurityScheme};

/// Represents a user making a request to the A2A server.
pub trait User: Send + Sync {
    /// Returns whether the user is authenticated.
    fn is_authenticated(&self) -> bool;

    /// Returns the user's display name.
    fn user_name(&self) -> &str;
}

/// An unauthenticated user.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnauthenticatedUser;

impl User for UnauthenticatedUser {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn user_name(&self) -> &str {
        "anonymous"
    }
}

/// A simple authenticated user.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The user's display name.
    pub name: String,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl User for AuthenticatedUser {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn user_name(&self) -> &str {
        &self.name
    }
}

/// Context for a single API call.
#[derive(Clone)]
pub struct CallContext {
    user: Arc<dyn User>,
    state: HashMap<String, serde_json::Value>,
    security: SecurityRequirement,
    security_schemes: HashMap<String, SecurityScheme>,
    cancellation: CancellationToken,
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("user_name", &self.user.user_name())
            .field("is_authenticated", &self.user.is_authenticated())
            .field("state", &self.state)
            .field("security", &self.security)
            .finish_non_exhaustive()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// Creates a context with an unauthenticated user and a fresh
    /// cancellation token.
    pub fn new() -> Self {
        Self {
            user: Arc::new(UnauthenticatedUser),
            state: HashMap::new(),
            security: SecurityRequirement::new(),
            security_schemes: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Returns a builder for assembling a context.
    pub fn builder() -> CallContextBuilder {
        CallContextBuilder::default()
    }

    /// Returns the user making the request.
    pub fn user(&self) -> &dyn User {
        self.user.as_ref()
    }

    /// Returns whether the user is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_authenticated()
    }

    /// Returns the cancellation token for this call.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Fires the cancellation signal.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns true once the call has been canceled.
    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Gets a value from the request state.
    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Sets a value in the request state.
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    /// Returns the security requirement for this call.
    pub fn security_requirement(&self) -> &SecurityRequirement {
        &self.security
    }

    /// Returns the security scheme registered under `name`.
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes.get(name)
    }
}

/// Builder for [`CallContext`].
#[derive(Default)]
pub struct CallContextBuilder {
    user: Option<Arc<dyn User>>,
    state: HashMap<String, serde_json::Value>,
    security: SecurityRequirement,
    security_schemes: HashMap<String, SecurityScheme>,
    cancellation: Option<CancellationToken>,
}

impl CallContextBuilder {
    /// Sets the user for the context.
    pub fn user(mut self, user: impl User + 'static) -> Self {
        self.user = Some(Arc::new(user));
        self
    }

    /// Adds a state value.
    pub fn state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state.insert(key.into(), value);
        self
    }

    /// Sets the security requirement and scheme tables.
    pub fn security(
        mut self,
        requirement: SecurityRequirement,
        schemes: HashMap<String, SecurityScheme>,
    ) -> Self {
        self.security = requirement;
        self.security_schemes = schemes;
        self
    }

    /// Sets the cancellation token flowing from the transport layer.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Builds the context.
    pub fn build(self) -> CallContext {
        CallContext {
            user: self.user.unwrap_or_else(|| Arc::new(UnauthenticatedUser)),
            state: self.state,
            security: self.security,
            security_schemes: self.security_schemes,
            cancellation: self.cancellation.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_anonymous() {
        let ctx = CallContext::new();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.user().user_name(), "anonymous");
        assert!(!ctx.is_canceled());
    }

    #[test]
    fn test_builder_with_user_and_state() {
        let ctx = CallContext::builder()
            .user(AuthenticatedUser::new("alice"))
            .state("method", serde_json::json!("POST"))
            .build();

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user().user_name(), "alice");
        assert_eq!(ctx.get_state("method"), Some(&serde_json::json!("POST")));
    }

    #[test]
    fn test_cancellation_flows_through() {
        let token = CancellationToken::new();
        let ctx = CallContext::builder().cancellation(token.clone()).build();
        token.cancel();
        assert!(ctx.is_canceled());
        assert!(ctx.cancellation_token().is_cancelled());
    }
}
