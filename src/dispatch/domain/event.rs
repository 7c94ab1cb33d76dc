//! Lifecycle notifications published by the dispatcher.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::{AuthorId, ChannelId, InvocationSummary, LoadFailure, MessageId};

/// Named lifecycle channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventChannel {
    /// An invocation was admitted.
    Started,
    /// A command set was (re)loaded.
    CommandsLoaded,
    /// A message did not match any command.
    Unknown,
    /// Middleware rejected an invocation.
    Invalid,
    /// A command returned a result.
    Finished,
    /// A programmer fault aborted an invocation.
    Failed,
    /// Argument collection was cancelled.
    Cancelled,
}

impl EventChannel {
    /// Returns the channel name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::CommandsLoaded => "commandsLoaded",
            Self::Unknown => "unknown",
            Self::Invalid => "invalid",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the pipeline a fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// A middleware step raised a fault.
    Middleware,
    /// An argument resolver raised a fault or a prompt could not be sent.
    ArgumentResolution,
    /// The command body raised a fault.
    Execution,
    /// The invocation state machine was driven illegally.
    Lifecycle,
}

impl FailureStage {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Middleware => "middleware",
            Self::ArgumentResolution => "argument_resolution",
            Self::Execution => "execution",
            Self::Lifecycle => "lifecycle",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why argument collection stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum CancelReason {
    /// The author replied with the cancel keyword.
    UserCancelled {
        /// Argument being collected.
        argument: String,
    },
    /// No reply arrived in time.
    TimedOut {
        /// Argument being collected.
        argument: String,
        /// Timeout that elapsed, in milliseconds.
        after_ms: u64,
    },
    /// A required argument has no prompt and was not supplied inline.
    MissingArgument {
        /// Argument that could not be collected.
        argument: String,
    },
    /// The embedding code cancelled the session.
    Requested {
        /// Argument being collected; empty when no prompt was pending.
        argument: String,
        /// Caller-supplied reason.
        reason: String,
    },
}

impl CancelReason {
    /// Returns the reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserCancelled { .. } => "user_cancelled",
            Self::TimedOut { .. } => "timed_out",
            Self::MissingArgument { .. } => "missing_argument",
            Self::Requested { .. } => "requested",
        }
    }

    /// Returns the argument that was being collected.
    #[must_use]
    pub fn argument(&self) -> &str {
        match self {
            Self::UserCancelled { argument }
            | Self::TimedOut { argument, .. }
            | Self::MissingArgument { argument }
            | Self::Requested { argument, .. } => argument,
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserCancelled { .. } => f.write_str("Command cancelled."),
            Self::TimedOut { after_ms, .. } => {
                write!(f, "No reply after {}s, command cancelled.", after_ms.div_ceil(1000))
            }
            Self::MissingArgument { argument } => {
                write!(f, "Missing required argument '{argument}', command cancelled.")
            }
            Self::Requested { reason, .. } => write!(f, "Command cancelled: {reason}"),
        }
    }
}

/// Lifecycle notification with its typed payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DispatchEvent {
    /// An invocation was admitted by the session guard.
    Started {
        /// Invocation snapshot.
        invocation: InvocationSummary,
    },
    /// A command set was loaded.
    CommandsLoaded {
        /// Names of the registered commands.
        loaded: Vec<String>,
        /// Sources that failed to load or register.
        failures: Vec<LoadFailure>,
    },
    /// A message matched no command.
    Unknown {
        /// Message identifier.
        message_id: MessageId,
        /// Author identity.
        author: AuthorId,
        /// Channel identity.
        channel: ChannelId,
        /// Raw message text.
        content: String,
    },
    /// Middleware rejected the invocation.
    Invalid {
        /// Invocation snapshot.
        invocation: InvocationSummary,
        /// Name of the rejecting middleware.
        middleware: String,
        /// Rejection reason, absent when suppressed.
        reason: Option<String>,
    },
    /// The command returned a result.
    Finished {
        /// Invocation snapshot.
        invocation: InvocationSummary,
        /// Command result.
        result: Value,
    },
    /// A programmer fault aborted the invocation.
    Failed {
        /// Invocation snapshot.
        invocation: InvocationSummary,
        /// Pipeline stage that faulted.
        stage: FailureStage,
        /// Fault message.
        error: String,
    },
    /// Argument collection was cancelled.
    Cancelled {
        /// Invocation snapshot.
        invocation: InvocationSummary,
        /// Why collection stopped.
        reason: CancelReason,
    },
}

impl DispatchEvent {
    /// Returns the channel this event is published on.
    #[must_use]
    pub const fn channel(&self) -> EventChannel {
        match self {
            Self::Started { .. } => EventChannel::Started,
            Self::CommandsLoaded { .. } => EventChannel::CommandsLoaded,
            Self::Unknown { .. } => EventChannel::Unknown,
            Self::Invalid { .. } => EventChannel::Invalid,
            Self::Finished { .. } => EventChannel::Finished,
            Self::Failed { .. } => EventChannel::Failed,
            Self::Cancelled { .. } => EventChannel::Cancelled,
        }
    }

    /// Returns the invocation snapshot, when the event concerns one.
    #[must_use]
    pub const fn invocation(&self) -> Option<&InvocationSummary> {
        match self {
            Self::Started { invocation }
            | Self::Invalid { invocation, .. }
            | Self::Finished { invocation, .. }
            | Self::Failed { invocation, .. }
            | Self::Cancelled { invocation, .. } => Some(invocation),
            Self::CommandsLoaded { .. } | Self::Unknown { .. } => None,
        }
    }
}
