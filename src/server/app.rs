//! Axum-based HTTP server for A2A agents.
//!
//! All JSON-RPC methods are dispatched on `POST /` through a single
//! [`RequestHandler`] held in [`ServerState`]. Streaming methods answer
//! with an SSE response whose frames are JSON-RPC success or error
//! objects, flushed per event. The agent card is served on the
//! well-known path.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{CallContext, RequestHandler};
use crate::error::{A2AError, JsonRpcError};
use crate::types::{
    AgentCard, JsonRpcRequest, MessageSendParams, RequestId, TaskIdParams,
    TaskPushNotificationConfig, TaskQueryParams, METHOD_MESSAGE_SEND, METHOD_MESSAGE_STREAM,
    METHOD_PUSH_CONFIG_GET, METHOD_PUSH_CONFIG_SET, METHOD_TASKS_CANCEL, METHOD_TASKS_GET,
    METHOD_TASKS_RESUBSCRIBE,
};

/// Configuration for the A2A server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Enable CORS for all origins.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Creates a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables or disables CORS.
    pub const fn cors(mut self, enabled: bool) -> Self {
        self.enable_cors = enabled;
        self
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Server state shared across all request handlers.
#[derive(Clone)]
pub struct ServerState {
    /// The request handler all methods are dispatched to.
    pub handler: Arc<dyn RequestHandler>,
    /// The agent card served on the well-known endpoint.
    pub agent_card: Arc<AgentCard>,
}

impl ServerState {
    /// Creates a server state from a handler and agent card.
    pub fn new(handler: Arc<dyn RequestHandler>, agent_card: AgentCard) -> Self {
        Self {
            handler,
            agent_card: Arc::new(agent_card),
        }
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("agent_card", &self.agent_card)
            .finish_non_exhaustive()
    }
}

/// A2A server application wrapping an Axum router.
pub struct A2AServer {
    router: Router,
    config: ServerConfig,
}

impl A2AServer {
    /// Creates a server from a state and configuration.
    pub fn new(state: ServerState, config: ServerConfig) -> Self {
        let router = Self::build_router(state, &config);
        Self { router, config }
    }

    /// Returns a builder for assembling a server.
    pub fn builder() -> A2AServerBuilder {
        A2AServerBuilder::default()
    }

    fn build_router(state: ServerState, config: &ServerConfig) -> Router {
        let mut router = Router::new()
            .route(crate::WELL_KNOWN_AGENT_CARD_PATH, get(handle_agent_card))
            .route("/", post(handle_jsonrpc))
            .route("/health", get(handle_health))
            .with_state(state);

        if config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
            router = router.layer(cors);
        }
        router
    }

    /// Returns the Axum router, for mounting or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Returns the server configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Starts the server and listens for incoming connections.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self.config.bind_address();
        info!("starting A2A server on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router).await
    }

    /// Starts the server with graceful shutdown support.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address();
        info!("starting A2A server on {addr} (with graceful shutdown)");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Builder for [`A2AServer`].
#[derive(Default)]
pub struct A2AServerBuilder {
    handler: Option<Arc<dyn RequestHandler>>,
    agent_card: Option<AgentCard>,
    config: ServerConfig,
}

impl A2AServerBuilder {
    /// Sets the request handler.
    pub fn handler(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets the agent card served on the well-known endpoint.
    pub fn agent_card(mut self, card: AgentCard) -> Self {
        self.agent_card = Some(card);
        self
    }

    /// Sets the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enables or disables CORS.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.enable_cors = enabled;
        self
    }

    /// Builds the server.
    ///
    /// # Panics
    ///
    /// Panics if the handler or agent card has not been set.
    pub fn build(self) -> A2AServer {
        let handler = self.handler.expect("handler must be set");
        let card = self.agent_card.expect("agent card must be set");
        A2AServer::new(ServerState::new(handler, card), self.config)
    }
}

/// Serves the agent metadata card.
async fn handle_agent_card(State(state): State<ServerState>) -> Json<AgentCard> {
    Json(state.agent_card.as_ref().clone())
}

/// Health probe.
async fn handle_health() -> &'static str {
    "OK"
}

/// Dispatches a JSON-RPC request to the configured handler.
async fn handle_jsonrpc(State(state): State<ServerState>, body: String) -> Response {
    let request: JsonRpcRequest<serde_json::Value> = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(_) => return error_response(None, JsonRpcError::parse_error()),
    };
    let id = request.id.clone();

    // the token is handed to every stream operation; SSE responses hold
    // a drop guard so a disconnect cancels in-flight work
    let token = CancellationToken::new();
    let context = CallContext::builder().cancellation(token.clone()).build();

    match request.method.as_str() {
        METHOD_MESSAGE_SEND => {
            let params: MessageSendParams = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state.handler.on_message_send(params, &context).await {
                Ok(event) => success_response(id, &event),
                Err(err) => a2a_error_response(id, err),
            }
        }
        METHOD_TASKS_GET => {
            let params: TaskQueryParams = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state.handler.on_get_task(params, &context).await {
                Ok(task) => success_response(id, &task),
                Err(err) => a2a_error_response(id, err),
            }
        }
        METHOD_TASKS_CANCEL => {
            let params: TaskIdParams = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state.handler.on_cancel_task(params, &context).await {
                Ok(task) => success_response(id, &task),
                Err(err) => a2a_error_response(id, err),
            }
        }
        METHOD_PUSH_CONFIG_SET => {
            let params: TaskPushNotificationConfig = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state
                .handler
                .on_set_push_notification_config(params, &context)
                .await
            {
                Ok(config) => success_response(id, &config),
                Err(err) => a2a_error_response(id, err),
            }
        }
        METHOD_PUSH_CONFIG_GET => {
            let params: TaskIdParams = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state
                .handler
                .on_get_push_notification_config(params, &context)
                .await
            {
                Ok(config) => success_response(id, &config),
                Err(err) => a2a_error_response(id, err),
            }
        }
        METHOD_MESSAGE_STREAM => {
            let params: MessageSendParams = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state.handler.on_message_stream(params, &context).await {
                Ok(stream) => sse_response(stream, id, token),
                Err(err) => a2a_error_response(id, err),
            }
        }
        METHOD_TASKS_RESUBSCRIBE => {
            let params: TaskIdParams = match parse_params(request.params) {
                Ok(params) => params,
                Err(err) => return error_response(Some(id), err),
            };
            match state.handler.on_resubscribe(params, &context).await {
                Ok(stream) => sse_response(stream, id, token),
                Err(err) => a2a_error_response(id, err),
            }
        }
        other => error_response(Some(id), JsonRpcError::method_not_found(other)),
    }
}

fn parse_params<P: DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<P, JsonRpcError> {
    let value = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(value).map_err(|err| JsonRpcError::invalid_params(err.to_string()))
}

fn success_response<R: serde::Serialize>(id: RequestId, result: &R) -> Response {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    });
    json_response(StatusCode::OK, body)
}

fn error_response(id: Option<RequestId>, error: JsonRpcError) -> Response {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": error.code, "message": error.message },
    });
    json_response(StatusCode::OK, body)
}

/// Maps handler failures to JSON-RPC error responses. The auth-required
/// flow-control signal becomes a 401 so the client can re-authenticate
/// while the task settles in the background.
fn a2a_error_response(id: RequestId, err: A2AError) -> Response {
    if err.is_auth_required() {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32603, "message": "authentication required" },
        });
        return json_response(StatusCode::UNAUTHORIZED, body);
    }
    error_response(Some(id), err.to_jsonrpc_error())
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Frames a stream of envelopes as SSE, one JSON-RPC frame per event.
///
/// The response owns a drop guard on the request's cancellation token:
/// when the client disconnects and the body is dropped, in-flight
/// subscriptions observe the cancellation.
fn sse_response(
    stream: super::EventStream,
    id: RequestId,
    token: CancellationToken,
) -> Response {
    use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};

    let guard = Arc::new(token.drop_guard());
    let frames = stream.filter_map(move |envelope| {
        let guard = Arc::clone(&guard);
        let frame = envelope.to_jsonrpc_frame(&id);
        async move {
            let _guard = guard;
            frame.map(|frame| {
                Ok::<_, std::convert::Infallible>(SseEvent::default().data(frame.to_string()))
            })
        }
    });

    Sse::new(frames).keep_alive(KeepAlive::default()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::new().host("127.0.0.1").port(3000).cors(false);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert!(!config.enable_cors);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.enable_cors);
    }
}
