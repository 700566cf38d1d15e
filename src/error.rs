//! Error types for the A2A server runtime.
//!
//! This module defines the error values used throughout the crate,
//! following the JSON-RPC 2.0 error specification and A2A-specific error
//! codes. Component-level operations return these values; the transport
//! layer translates them into JSON-RPC error responses at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::TaskState;

/// A specialized Result type for A2A operations.
pub type Result<T> = std::result::Result<T, A2AError>;

/// The main error type for the A2A server runtime.
///
/// The enum is `Clone` so that a terminal Error envelope can fan out to
/// every child queue of a tap tree.
#[derive(Error, Debug, Clone)]
pub enum A2AError {
    /// JSON-RPC protocol error.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    /// No task exists for the given ID.
    #[error("task '{0}' not found")]
    TaskNotFound(String),

    /// A read was requested but no task ID was ever configured.
    #[error("task id is not set")]
    TaskIdNotSet,

    /// An event carried a task ID that differs from the manager's.
    #[error("task id mismatch: expected '{expected}', got '{actual}'")]
    TaskIdMismatch {
        /// The task ID the manager was configured with.
        expected: String,
        /// The task ID carried by the event.
        actual: String,
    },

    /// An event carried a context ID that differs from the manager's.
    #[error("context id mismatch: expected '{expected}', got '{actual}'")]
    ContextIdMismatch {
        /// The context ID the manager was configured with.
        expected: String,
        /// The context ID carried by the event.
        actual: String,
    },

    /// The task is in a terminal state and cannot be canceled.
    #[error("task '{0}' cannot be canceled")]
    TaskNotCancelable(String),

    /// The task is already in a terminal state and accepts no new messages.
    #[error("task '{task_id}' is in terminal state: {state:?}")]
    TaskTerminalState {
        /// The task ID.
        task_id: String,
        /// The terminal state the task is in.
        state: TaskState,
    },

    /// The requested operation is not supported by this server.
    #[error("operation '{0}' is not supported")]
    UnsupportedOperation(String),

    /// Push notifications are not configured on this server.
    #[error("push notification is not supported")]
    PushNotificationNotSupported,

    /// The agent requires authentication before the task can proceed.
    ///
    /// Not a failure: a signal to break the synchronous send flow while
    /// the event stream continues to drain in the background.
    #[error("authentication required")]
    AuthRequired,

    /// An event with an unrecognized `kind` discriminator.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    /// The agent produced a response the flow cannot use.
    #[error("invalid agent response: {0}")]
    InvalidAgentResponse(String),

    /// The event queue has been closed.
    #[error("queue is closed")]
    QueueClosed,

    /// A parent queue already exists for the task.
    #[error("event queue already exists for task '{0}'")]
    QueueExists(String),

    /// No queue exists for the task.
    #[error("no event queue exists for task '{0}'")]
    QueueNotFound(String),

    /// The operation was canceled, carrying the cause.
    #[error("canceled: {0}")]
    Canceled(String),

    /// Task store I/O failure.
    #[error("store error: {0}")]
    Store(String),

    /// JSON serialization/deserialization failure.
    #[error("JSON error: {0}")]
    Json(String),

    /// HTTP delivery failure (push notifications).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl A2AError {
    /// Translates this error into the JSON-RPC error object sent to clients.
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::JsonRpc(e) => e.clone(),
            Self::TaskNotFound(id) => JsonRpcError::task_not_found(id),
            Self::TaskNotCancelable(id) => JsonRpcError::task_not_cancelable(id),
            Self::TaskTerminalState { .. }
            | Self::TaskIdNotSet
            | Self::TaskIdMismatch { .. }
            | Self::ContextIdMismatch { .. } => JsonRpcError::invalid_params(self.to_string()),
            Self::UnsupportedOperation(op) => JsonRpcError::unsupported_operation(op),
            Self::PushNotificationNotSupported => JsonRpcError::push_notification_not_supported(),
            Self::UnknownEventKind(_) | Self::Json(_) => {
                JsonRpcError::invalid_request(self.to_string())
            }
            _ => JsonRpcError::internal_error(self.to_string()),
        }
    }

    /// Returns true if this error is the auth-required flow-control signal.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    /// Returns true if this error was caused by cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }
}

impl From<serde_json::Error> for A2AError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<reqwest::Error> for A2AError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// JSON-RPC 2.0 error codes used by the A2A protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum JsonRpcErrorCode {
    /// Invalid JSON was received by the server.
    ParseError = -32700,
    /// The JSON sent is not a valid Request object.
    InvalidRequest = -32600,
    /// The method does not exist / is not available.
    MethodNotFound = -32601,
    /// Invalid method parameter(s).
    InvalidParams = -32602,
    /// Internal JSON-RPC error.
    InternalError = -32603,

    // A2A-specific error codes
    /// Task not found.
    TaskNotFound = -32000,
    /// Task cannot be canceled.
    TaskNotCancelable = -32001,
    /// Push notification not supported.
    PushNotificationNotSupported = -32002,
    /// Operation not supported.
    UnsupportedOperation = -32003,
}

impl JsonRpcErrorCode {
    /// Returns the default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ParseError => "Invalid JSON payload",
            Self::InvalidRequest => "Request payload validation error",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid parameters",
            Self::InternalError => "Internal error",
            Self::TaskNotFound => "Task not found",
            Self::TaskNotCancelable => "Task cannot be canceled",
            Self::PushNotificationNotSupported => "Push Notification is not supported",
            Self::UnsupportedOperation => "This operation is not supported",
        }
    }
}

impl From<i32> for JsonRpcErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32000 => Self::TaskNotFound,
            -32001 => Self::TaskNotCancelable,
            -32002 => Self::PushNotificationNotSupported,
            -32003 => Self::UnsupportedOperation,
            _ => Self::InternalError,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub struct JsonRpcError {
    /// A number indicating the error type.
    pub code: i32,
    /// A short description of the error.
    pub message: String,
    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl JsonRpcError {
    /// Creates a new JSON-RPC error.
    pub fn new(code: JsonRpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a new JSON-RPC error with additional data.
    pub fn with_data(
        code: JsonRpcErrorCode,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Creates a parse error.
    pub fn parse_error() -> Self {
        Self::new(
            JsonRpcErrorCode::ParseError,
            JsonRpcErrorCode::ParseError.default_message(),
        )
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, message)
    }

    /// Creates a method not found error.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::MethodNotFound,
            format!("Method '{}' not found", method),
        )
    }

    /// Creates an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidParams, message)
    }

    /// Creates an internal error.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, message)
    }

    /// Creates a task not found error.
    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::TaskNotFound,
            format!("Task '{}' not found", task_id),
        )
    }

    /// Creates a task not cancelable error.
    pub fn task_not_cancelable(task_id: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::TaskNotCancelable,
            format!("Task '{}' cannot be canceled", task_id),
        )
    }

    /// Creates a push notification not supported error.
    pub fn push_notification_not_supported() -> Self {
        Self::new(
            JsonRpcErrorCode::PushNotificationNotSupported,
            JsonRpcErrorCode::PushNotificationNotSupported.default_message(),
        )
    }

    /// Creates an unsupported operation error.
    pub fn unsupported_operation(operation: &str) -> Self {
        Self::new(
            JsonRpcErrorCode::UnsupportedOperation,
            format!("Operation '{}' is not supported", operation),
        )
    }

    /// Returns the error code as an enum variant.
    pub fn error_code(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_conversion() {
        assert_eq!(JsonRpcErrorCode::from(-32700), JsonRpcErrorCode::ParseError);
        assert_eq!(
            JsonRpcErrorCode::from(-32000),
            JsonRpcErrorCode::TaskNotFound
        );
        assert_eq!(
            JsonRpcErrorCode::from(-32001),
            JsonRpcErrorCode::TaskNotCancelable
        );
    }

    #[test]
    fn test_json_rpc_error_serialization() {
        let error = JsonRpcError::task_not_found("test-123");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("-32000"));
        assert!(json.contains("test-123"));
    }

    #[test]
    fn test_task_not_found_mapping() {
        let err = A2AError::TaskNotFound("t1".into());
        assert_eq!(err.to_jsonrpc_error().code, -32000);
    }

    #[test]
    fn test_terminal_state_maps_to_invalid_params() {
        let err = A2AError::TaskTerminalState {
            task_id: "t1".into(),
            state: TaskState::Completed,
        };
        assert_eq!(err.to_jsonrpc_error().code, -32602);
    }

    #[test]
    fn test_auth_required_signal() {
        assert!(A2AError::AuthRequired.is_auth_required());
        assert!(!A2AError::TaskIdNotSet.is_auth_required());
    }

    #[test]
    fn test_unsupported_operation_mapping() {
        let err = A2AError::UnsupportedOperation("tasks/pushNotificationConfig/set".into());
        assert_eq!(err.to_jsonrpc_error().code, -32003);
    }
}
