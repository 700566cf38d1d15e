//! Example: a minimal A2A agent server.
//!
//! Runs an echo-style agent behind the JSON-RPC front-end. Try it with:
//!
//! ```sh
//! curl -s http://localhost:8080/.well-known/agent.json
//! curl -s -X POST http://localhost:8080/ -d '{
//!   "jsonrpc": "2.0", "id": "1", "method": "message/send",
//!   "params": {"message": {"role": "user", "message_id": "m1",
//!     "parts": [{"kind": "text", "text": "hello"}]}}
//! }'
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sa2a::{
    A2AServer, AgentCapabilities, AgentCard, AgentExecutor, AgentSkill, DefaultRequestHandler,
    EventQueue, InMemoryTaskStore, Part, RequestContext, Result, TaskStore,
};
use sa2a::server::{StatusOptions, TaskUpdater};
use sa2a::types::TaskState;

/// An agent that echoes the user's message back as an artifact.
struct EchoExecutor;

#[async_trait]
impl AgentExecutor for EchoExecutor {
    async fn execute(&self, ctx: &RequestContext, queue: Arc<EventQueue>) -> Result<()> {
        let updater = TaskUpdater::new(queue, &ctx.task_id, &ctx.context_id);
        updater.start_work(StatusOptions::default());

        let text = ctx
            .message()
            .and_then(|m| m.text_content())
            .unwrap_or_else(|| "(empty message)".to_string());
        updater.add_artifact(vec![Part::text(format!("echo: {text}"))], Default::default());

        let reply = updater.new_agent_message(vec![Part::text("done")], None);
        updater.complete(StatusOptions {
            message: Some(reply),
            ..Default::default()
        });
        Ok(())
    }

    async fn cancel(&self, ctx: &RequestContext, queue: Arc<EventQueue>) -> Result<()> {
        let updater = TaskUpdater::new(queue, &ctx.task_id, &ctx.context_id);
        updater.update_status(
            TaskState::Canceled,
            StatusOptions {
                r#final: Some(true),
                ..Default::default()
            },
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let card = AgentCard::builder("Echo Agent", "http://localhost:8080")
        .description("Echoes whatever it hears back as an artifact.")
        .version("1.0.0")
        .capabilities(AgentCapabilities {
            streaming: Some(true),
            ..Default::default()
        })
        .skill(AgentSkill::new("echo", "Echo", "Repeats the input"))
        .build();

    let store = Arc::new(InMemoryTaskStore::new()) as Arc<dyn TaskStore>;
    let handler = Arc::new(DefaultRequestHandler::new(EchoExecutor, store));

    let server = A2AServer::builder()
        .handler(handler)
        .agent_card(card)
        .host("0.0.0.0")
        .port(8080)
        .build();

    server
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
