//! Domain model for command dispatch.
//!
//! Triggers, descriptors, invocations, and lifecycle events are plain values
//! here; anything that talks to a chat service or a clock lives behind the
//! ports.

mod argument;
mod descriptor;
mod error;
mod event;
mod ids;
mod invocation;
mod message;
mod trigger;
mod validation;

pub use argument::{
    ArgumentDescriptor, ArgumentMatcher, CancelPattern, MatchedCandidate, ResolvedArguments,
};
pub use descriptor::{CommandDescriptor, LoadFailure, LoadReport, TriggerMatch};
pub use error::{CommandFault, InvocationError, RegistryError};
pub use event::{CancelReason, DispatchEvent, EventChannel, FailureStage};
pub use ids::{AuthorId, ChannelId, InvocationId, MessageId, SessionKey};
pub use invocation::{Invocation, InvocationStatus, InvocationSummary};
pub use message::{ChannelKind, InboundMessage, OutboundContent, SentMessage, Tone};
pub use trigger::{Trigger, TriggerHit, TriggerPredicate, is_case_sensitive};
pub(crate) use trigger::strip_literal;
pub use validation::ValidationResult;
