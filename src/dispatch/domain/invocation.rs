//! Invocation aggregate and its lifecycle status machine.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::{
    CommandDescriptor, InboundMessage, InvocationError, InvocationId, ResolvedArguments,
    SessionKey, TriggerMatch,
};

/// Lifecycle status of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// Matched but not yet validated.
    Created,
    /// Running the middleware chain.
    Validating,
    /// Resolving declared arguments.
    CollectingArgs,
    /// Running the command body.
    Executing,
    /// The command body returned a result.
    Completed,
    /// Argument collection was cancelled or timed out.
    Cancelled,
    /// Validation rejected the invocation or a fault occurred.
    Failed,
}

impl InvocationStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validating => "validating",
            Self::CollectingArgs => "collecting_args",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Validating | Self::Failed)
                | (
                    Self::Validating,
                    Self::CollectingArgs | Self::Executing | Self::Cancelled | Self::Failed
                )
                | (
                    Self::CollectingArgs,
                    Self::Executing | Self::Cancelled | Self::Failed
                )
                | (Self::Executing, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempt to run a command against one message.
#[derive(Debug, Clone)]
pub struct Invocation {
    id: InvocationId,
    message: InboundMessage,
    descriptor: Arc<CommandDescriptor>,
    trigger: String,
    body: String,
    arguments: ResolvedArguments,
    status: InvocationStatus,
    session: SessionKey,
    created_at: DateTime<Utc>,
}

impl Invocation {
    /// Creates an invocation in the `created` status.
    #[must_use]
    pub fn new(matched: TriggerMatch, message: InboundMessage, clock: &impl Clock) -> Self {
        let session = message.session_key();
        Self {
            id: InvocationId::new(),
            message,
            descriptor: matched.descriptor,
            trigger: matched.trigger,
            body: matched.body,
            arguments: ResolvedArguments::new(),
            status: InvocationStatus::Created,
            session,
            created_at: clock.utc(),
        }
    }

    /// Returns the invocation identifier.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the originating message.
    #[must_use]
    pub const fn message(&self) -> &InboundMessage {
        &self.message
    }

    /// Returns the matched command.
    #[must_use]
    pub const fn descriptor(&self) -> &Arc<CommandDescriptor> {
        &self.descriptor
    }

    /// Returns the text that matched the trigger.
    #[must_use]
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Returns the body not yet consumed by argument matchers.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the resolved arguments.
    #[must_use]
    pub const fn arguments(&self) -> &ResolvedArguments {
        &self.arguments
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> InvocationStatus {
        self.status
    }

    /// Returns the session key.
    #[must_use]
    pub const fn session(&self) -> &SessionKey {
        &self.session
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Replaces the remaining body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into().trim().to_owned();
    }

    /// Stores a resolved argument value.
    pub fn insert_argument(&mut self, key: impl Into<String>, value: Value) {
        self.arguments.insert(key, value);
    }

    /// Moves the invocation to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::InvalidTransition`] when the status machine
    /// does not allow the move.
    pub fn transition_to(&mut self, next: InvocationStatus) -> Result<(), InvocationError> {
        if !self.status.can_transition_to(next) {
            return Err(InvocationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Builds the serializable event payload.
    #[must_use]
    pub fn summary(&self) -> InvocationSummary {
        InvocationSummary {
            id: self.id,
            command: self.descriptor.name().to_owned(),
            trigger: self.trigger.clone(),
            author: self.message.author().to_string(),
            channel: self.message.channel().to_string(),
            status: self.status,
            arguments: self.arguments.clone(),
            created_at: self.created_at,
        }
    }
}

/// Serializable snapshot of an invocation carried by lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationSummary {
    /// Invocation identifier.
    pub id: InvocationId,
    /// Command name.
    pub command: String,
    /// Matched trigger text.
    pub trigger: String,
    /// Author identity.
    pub author: String,
    /// Channel identity.
    pub channel: String,
    /// Status at the time of the event.
    pub status: InvocationStatus,
    /// Arguments resolved so far.
    pub arguments: ResolvedArguments,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
