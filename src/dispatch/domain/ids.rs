//! Identifier newtypes for invocations, authors, channels, and messages.
//!
//! Transport identifiers are opaque strings (chat services disagree on their
//! shape), while invocation identifiers are generated locally as UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one invocation attempt.
///
/// # Examples
///
/// ```
/// use parley::dispatch::domain::InvocationId;
///
/// let id = InvocationId::new();
/// assert!(!id.as_ref().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Creates a new random invocation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an invocation identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

/// Note: generates a new random UUID on each call. Use
/// `InvocationId::new()` when the intent should be explicit.
impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for InvocationId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! transport_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a transport-assigned identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

transport_id!(
    /// Identity of a message author as attached by the transport.
    AuthorId
);

transport_id!(
    /// Identity of the channel a message was posted in.
    ChannelId
);

transport_id!(
    /// Transport identifier of a single chat message.
    MessageId
);

/// Key identifying one conversational session: an author in a channel.
///
/// Derived deterministically from the two identities, so the same author in
/// two channels holds two independent sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    author: AuthorId,
    channel: ChannelId,
}

impl SessionKey {
    /// Creates a session key from author and channel identities.
    #[must_use]
    pub const fn new(author: AuthorId, channel: ChannelId) -> Self {
        Self { author, channel }
    }

    /// Returns the author half of the key.
    #[must_use]
    pub const fn author(&self) -> &AuthorId {
        &self.author
    }

    /// Returns the channel half of the key.
    #[must_use]
    pub const fn channel(&self) -> &ChannelId {
        &self.channel
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.author, self.channel)
    }
}
