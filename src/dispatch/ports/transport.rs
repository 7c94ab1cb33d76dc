//! Outbound chat transport port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::dispatch::domain::{AuthorId, ChannelId, OutboundContent, SentMessage};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Send and edit primitives of a chat service.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Posts a new message in `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the service refuses or is unreachable.
    async fn send(
        &self,
        channel: &ChannelId,
        content: &OutboundContent,
    ) -> TransportResult<SentMessage>;

    /// Replaces the content of a previously sent message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the message cannot be edited.
    async fn edit(
        &self,
        previous: &SentMessage,
        content: &OutboundContent,
    ) -> TransportResult<SentMessage>;

    /// Sends a private message to `author`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the author cannot be messaged.
    async fn send_direct(
        &self,
        author: &AuthorId,
        content: &OutboundContent,
    ) -> TransportResult<SentMessage>;
}

/// Errors returned by transport implementations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The bot may not post in the channel.
    #[error("missing permission to post in channel {0}")]
    Forbidden(ChannelId),

    /// The message to edit no longer exists.
    #[error("message {0} can no longer be edited")]
    Gone(String),

    /// The author does not accept direct messages.
    #[error("author {0} does not accept direct messages")]
    DirectUnavailable(AuthorId),

    /// Service-level failure.
    #[error("delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps a service error.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
