//! # sa2a
//!
//! A server-side runtime for the `Agent2Agent` (A2A) protocol.
//!
//! The crate wires a JSON-RPC front-end to a user-supplied
//! [`AgentExecutor`]: the executor writes a stream of events into a
//! per-task [`EventQueue`], and consumer strategies translate that stream
//! into synchronous replies, SSE streams, or an interruptible drain that
//! breaks on `auth_required` while persistence continues in the background.
//!
//! ## Features
//!
//! - **A2A Protocol Compliant**: `message/send`, `message/stream`,
//!   `tasks/get`, `tasks/cancel`, `tasks/resubscribe`, and
//!   push-notification configuration
//! - **Async/Await**: Built on tokio for high-performance async operations
//! - **Type-Safe**: Strongly typed models with serde serialization
//! - **Pluggable**: task store, push notifier, and request handler are traits

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod server;
pub mod types;

pub use error::{A2AError, JsonRpcError, JsonRpcErrorCode, Result};
pub use server::{
    A2AServer, A2AServerBuilder, AgentExecutor, AuthenticatedUser, CallContext,
    CallContextBuilder, DefaultRequestHandler, EventQueue, EventStream, InMemoryPushNotifier,
    InMemoryTaskStore, PushNotifier, QueueManager, RequestContext, RequestContextBuilder,
    RequestHandler, ResultAggregator, ServerConfig, ServerState, TaskManager, TaskStore,
    TaskUpdater, UnauthenticatedUser, User, WebhookPushNotifier,
};
pub use types::{
    AgentCapabilities, AgentCard, AgentSkill, Artifact, Event, JsonRpcErrorResponse,
    JsonRpcRequest, JsonRpcSuccessResponse, Message, MessageSendConfiguration, MessageSendParams,
    Part, PushNotificationConfig, RequestId, Role, SecurityScheme, StreamEvent, Task, TaskIdParams,
    TaskPushNotificationConfig, TaskQueryParams, TaskState, TaskStatus,
};

/// Protocol version supported by this runtime.
pub const PROTOCOL_VERSION: &str = "0.2.0";

/// Well-known path for the public agent card endpoint.
pub const WELL_KNOWN_AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Runtime version.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
