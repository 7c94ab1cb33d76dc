//! Reply port handed to commands.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::transport::TransportError;
use crate::dispatch::domain::{AuthorId, ChannelId, OutboundContent, SentMessage};

/// Result type for reply delivery.
///
/// `Ok(None)` only when `catchall` swallowed a failure.
pub type ResponseResult = Result<Option<SentMessage>, ResponseError>;

/// Per-call delivery options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    /// Always send a new message, even in edit mode.
    pub force: bool,
    /// Swallow delivery failures, resolving to `None`.
    pub catchall: bool,
}

impl SendOptions {
    /// Sets `force`.
    #[must_use]
    pub const fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Sets `catchall`.
    #[must_use]
    pub const fn catchall(mut self) -> Self {
        self.catchall = true;
        self
    }
}

/// Errors returned when a reply cannot be delivered.
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    /// Sending failed and no fallback applied.
    #[error("could not deliver to {channel}: {source}")]
    Delivery {
        /// Target channel.
        channel: ChannelId,
        /// Transport failure.
        source: TransportError,
    },

    /// Sending failed and so did the direct-message fallback.
    #[error("could not deliver to {channel} ({primary}) nor directly to {author} ({fallback})")]
    DirectFallback {
        /// Target channel.
        channel: ChannelId,
        /// Author messaged as fallback.
        author: AuthorId,
        /// Channel failure.
        primary: TransportError,
        /// Direct-message failure.
        fallback: TransportError,
    },
}

/// Ordered reply queue for one invocation.
#[async_trait]
pub trait Responder: fmt::Debug + Send + Sync {
    /// Queues `content` and waits for its delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError`] when delivery and its fallback fail and
    /// `catchall` is unset.
    async fn send(&self, content: OutboundContent, options: SendOptions) -> ResponseResult;

    /// Sends plain text with default options.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError`] when delivery and its fallback fail.
    async fn reply(&self, text: &str) -> ResponseResult {
        self.send(OutboundContent::plain(text), SendOptions::default())
            .await
    }

    /// Sends error-toned text.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError`] when delivery and its fallback fail.
    async fn error(&self, text: &str) -> ResponseResult {
        self.send(OutboundContent::error(text), SendOptions::default())
            .await
    }

    /// Sends success-toned text.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError`] when delivery and its fallback fail.
    async fn success(&self, text: &str) -> ResponseResult {
        self.send(OutboundContent::success(text), SendOptions::default())
            .await
    }
}
