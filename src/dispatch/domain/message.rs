//! Normalized inbound and outbound chat message types.

use serde::{Deserialize, Serialize};

use super::{AuthorId, ChannelId, MessageId, SessionKey};

/// Kind of channel a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Shared channel (server, group, room).
    #[default]
    Guild,
    /// Private conversation between the bot and one author.
    Direct,
}

impl ChannelKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guild => "guild",
            Self::Direct => "direct",
        }
    }
}

/// A normalized inbound message handed over by the transport.
///
/// Every field is untrusted input; the dispatcher never assumes the content
/// is a command.
///
/// # Examples
///
/// ```
/// use parley::dispatch::domain::{ChannelKind, InboundMessage};
///
/// let message = InboundMessage::new("m-1", "alice", "general", "x!ping");
/// assert_eq!(message.channel_kind(), ChannelKind::Guild);
/// assert_eq!(message.session_key().to_string(), "alice@general");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    id: MessageId,
    author: AuthorId,
    channel: ChannelId,
    channel_kind: ChannelKind,
    content: String,
    automated: bool,
}

impl InboundMessage {
    /// Creates a message posted by a human author in a shared channel.
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        author: impl Into<AuthorId>,
        channel: impl Into<ChannelId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            channel: channel.into(),
            channel_kind: ChannelKind::Guild,
            content: content.into(),
            automated: false,
        }
    }

    /// Sets the channel kind.
    #[must_use]
    pub const fn with_channel_kind(mut self, channel_kind: ChannelKind) -> Self {
        self.channel_kind = channel_kind;
        self
    }

    /// Marks the message as posted by an automated account (including the
    /// bot itself).
    #[must_use]
    pub const fn automated(mut self) -> Self {
        self.automated = true;
        self
    }

    /// Returns the transport message identifier.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the author identity.
    #[must_use]
    pub const fn author(&self) -> &AuthorId {
        &self.author
    }

    /// Returns the channel identity.
    #[must_use]
    pub const fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Returns the channel kind.
    #[must_use]
    pub const fn channel_kind(&self) -> ChannelKind {
        self.channel_kind
    }

    /// Returns the raw text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns whether the message came from an automated account.
    #[must_use]
    pub const fn is_automated(&self) -> bool {
        self.automated
    }

    /// Returns whether the message arrived in a direct channel.
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        matches!(self.channel_kind, ChannelKind::Direct)
    }

    /// Derives the session key for this message.
    #[must_use]
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.author.clone(), self.channel.clone())
    }
}

/// Presentation hint for outbound content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Ordinary reply.
    #[default]
    Plain,
    /// Failure notice.
    Error,
    /// Success notice.
    Success,
}

/// Text queued for delivery, with a tone the transport may render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundContent {
    /// Message text.
    pub text: String,
    /// Presentation hint.
    pub tone: Tone,
}

impl OutboundContent {
    /// Creates plain content.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::with_tone(text, Tone::Plain)
    }

    /// Creates error-toned content.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::with_tone(text, Tone::Error)
    }

    /// Creates success-toned content.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_tone(text, Tone::Success)
    }

    /// Creates content with an explicit tone.
    #[must_use]
    pub fn with_tone(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// A message the transport reports as delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Transport identifier of the delivered message.
    pub id: MessageId,
    /// Channel the message landed in (a direct channel after fallback).
    pub channel: ChannelId,
    /// Delivered content.
    pub content: OutboundContent,
}

impl SentMessage {
    /// Creates a delivery record.
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        channel: impl Into<ChannelId>,
        content: OutboundContent,
    ) -> Self {
        Self {
            id: id.into(),
            channel: channel.into(),
            content,
        }
    }
}
