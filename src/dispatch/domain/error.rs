//! Error types for dispatch domain values.

use std::error::Error as StdError;
use thiserror::Error;

use super::InvocationStatus;

/// A programmer error raised by a command, middleware, or resolver.
///
/// Faults never reach the user as a reply; the dispatcher reports them
/// through the `failed` lifecycle event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CommandFault(pub String);

impl CommandFault {
    /// Creates a fault from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Captures the display text of a foreign error.
    #[must_use]
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        Self(err.to_string())
    }

    /// Returns the fault message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors raised by the invocation aggregate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationError {
    /// The status machine does not allow the requested move.
    #[error("invalid invocation transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: InvocationStatus,
        /// Requested status.
        to: InvocationStatus,
    },
}

/// Errors raised while registering commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A literal trigger is already owned by another command.
    #[error("trigger '{trigger}' of '{command}' is already registered by '{existing}'")]
    DuplicateTrigger {
        /// Colliding trigger.
        trigger: String,
        /// Command being registered.
        command: String,
        /// Command that already owns the trigger.
        existing: String,
    },

    /// The descriptor is malformed.
    #[error("invalid command '{command}': {reason}")]
    InvalidDefinition {
        /// Command name.
        command: String,
        /// What is wrong.
        reason: String,
    },
}

impl RegistryError {
    /// Returns the name of the command that failed to register.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::DuplicateTrigger { command, .. } | Self::InvalidDefinition { command, .. } => {
                command
            }
        }
    }
}
