//! A2A server implementation.
//!
//! # Architecture
//!
//! - **HTTP transport**: Axum-based JSON-RPC endpoint with SSE streaming
//! - **Event queues**: per-task bounded channels with child taps
//! - **Task manager**: per-request state materialization into the store
//! - **Consumer strategies**: full drain, streaming pass-through, and
//!   interruptible drain

mod app;
mod call_context;
mod default_handler;
mod events;
mod handler;
mod push;
mod request_context;
mod tasks;

pub use app::*;
pub use call_context::*;
pub use default_handler::*;
pub use events::*;
pub use handler::*;
pub use push::*;
pub use request_context::*;
pub use tasks::*;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Execution contract for agent business logic.
///
/// The executor writes events into the queue (via a [`TaskUpdater`] or
/// directly) and returns when work is complete or an error occurred. A
/// returned error is surfaced to subscribers as a terminal Error
/// envelope by the handler.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Processes the request, writing progress and results into `queue`.
    async fn execute(&self, ctx: &RequestContext, queue: Arc<EventQueue>) -> Result<()>;

    /// Cancels the task, writing the resulting state into `queue`.
    async fn cancel(&self, ctx: &RequestContext, queue: Arc<EventQueue>) -> Result<()>;
}
