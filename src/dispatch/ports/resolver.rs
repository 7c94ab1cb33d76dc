//! Argument and command resolver ports.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use std::sync::Arc;

use crate::dispatch::domain::{
    ArgumentDescriptor, CommandDescriptor, CommandFault, InboundMessage, ResolvedArguments,
    TriggerMatch,
};

/// Result type for argument resolution.
///
/// `Ok(None)` means the candidate did not resolve and the author should be
/// prompted (or the argument skipped when optional).
pub type ResolveResult = Result<Option<Value>, ResolveError>;

/// Why a candidate was not turned into a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The candidate is unacceptable; the reason becomes the next re-prompt.
    #[error("{0}")]
    Rejected(String),

    /// The resolver itself is broken.
    #[error(transparent)]
    Fault(#[from] CommandFault),
}

impl ResolveError {
    /// Creates a user-facing rejection.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// What a resolver can see besides the candidate text.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Originating message.
    pub message: &'a InboundMessage,
    /// Arguments resolved before this one.
    pub arguments: &'a ResolvedArguments,
    /// Descriptor of the argument being resolved.
    pub descriptor: &'a ArgumentDescriptor,
    /// Zero for the inline candidate, then one per reply.
    pub attempt: u32,
}

/// Turns candidate text into an argument value.
#[async_trait]
pub trait ArgumentResolver: Send + Sync {
    /// Resolves `candidate`, which is empty when nothing was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Rejected`] to re-prompt with a reason and
    /// [`ResolveError::Fault`] for programmer errors.
    async fn resolve(&self, candidate: &str, ctx: &ResolveContext<'_>) -> ResolveResult;
}

/// Outcome of a custom command resolver.
#[derive(Debug, Clone)]
pub enum CustomResolution {
    /// Use this text as the body for trigger matching.
    Body(String),
    /// Skip trigger matching and run this command.
    Match(TriggerMatch),
    /// Defer to the next resolver or the prefixes.
    Pass,
}

/// Read access to the registered commands.
pub trait CommandLookup {
    /// Finds the command triggered by `body`.
    fn find_trigger(&self, message: &InboundMessage, body: &str) -> Option<TriggerMatch>;

    /// Finds a command by name.
    fn find_command(&self, name: &str) -> Option<Arc<CommandDescriptor>>;
}

/// Embedding-supplied hook run before prefix matching.
pub trait CustomResolver: Send + Sync {
    /// Inspects the message against the current registry snapshot.
    fn resolve(&self, message: &InboundMessage, commands: &dyn CommandLookup)
    -> CustomResolution;
}

impl<F> CustomResolver for F
where
    F: Fn(&InboundMessage, &dyn CommandLookup) -> CustomResolution + Send + Sync,
{
    fn resolve(
        &self,
        message: &InboundMessage,
        commands: &dyn CommandLookup,
    ) -> CustomResolution {
        self(message, commands)
    }
}
