//! Command capability port.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::middleware::Middleware;
use super::responder::Responder;
use crate::dispatch::domain::{
    CommandFault, InboundMessage, Invocation, InvocationId, ResolvedArguments,
};

/// Result type for command execution.
pub type CommandResult = Result<Value, CommandFault>;

/// Everything a command body can see while it runs.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Invocation identifier.
    pub id: InvocationId,
    /// Command name.
    pub command: String,
    /// Matched trigger text.
    pub trigger: String,
    /// Body left after argument matching.
    pub body: String,
    /// Originating message.
    pub message: InboundMessage,
    /// Resolved arguments in declaration order.
    pub arguments: ResolvedArguments,
    /// Serialized reply channel for this invocation.
    pub response: Arc<dyn Responder>,
}

impl ExecutionContext {
    /// Builds the context for an invocation about to execute.
    #[must_use]
    pub fn from_invocation(invocation: &Invocation, response: Arc<dyn Responder>) -> Self {
        Self {
            id: invocation.id(),
            command: invocation.descriptor().name().to_owned(),
            trigger: invocation.trigger().to_owned(),
            body: invocation.body().to_owned(),
            message: invocation.message().clone(),
            arguments: invocation.arguments().clone(),
            response,
        }
    }

    /// Returns a resolved argument.
    #[must_use]
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }
}

/// A runnable command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Runs the command body with fully resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault`] for programmer errors; the dispatcher reports
    /// them through the `failed` event and never replies to the user.
    async fn execute(&self, ctx: ExecutionContext) -> CommandResult;

    /// Middleware run after the global chain, in declaration order.
    fn middleware(&self) -> Vec<Arc<dyn Middleware>> {
        Vec::new()
    }
}
