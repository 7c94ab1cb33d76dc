//! Serialized per-invocation reply channel.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::dispatch::domain::{
    AuthorId, ChannelId, ChannelKind, InboundMessage, OutboundContent, SentMessage,
};
use crate::dispatch::ports::{
    MessageTransport, Responder, ResponseError, ResponseResult, SendOptions,
};

struct ResponseInner {
    transport: Arc<dyn MessageTransport>,
    channel: ChannelId,
    channel_kind: ChannelKind,
    author: AuthorId,
    edit: bool,
    // Fair FIFO lock; holding it for a whole delivery serializes the queue.
    last: Mutex<Option<SentMessage>>,
}

/// FIFO reply queue bound to one invocation's channel and author.
///
/// Calls are delivered strictly one after another in call order, even when
/// callers do not await each other. In edit mode each reply after the first
/// edits the previous one unless forced.
#[derive(Clone)]
pub struct ResponseChannel {
    inner: Arc<ResponseInner>,
}

impl fmt::Debug for ResponseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseChannel")
            .field("channel", &self.inner.channel)
            .field("channel_kind", &self.inner.channel_kind)
            .field("author", &self.inner.author)
            .field("edit", &self.inner.edit)
            .finish_non_exhaustive()
    }
}

impl ResponseChannel {
    /// Creates a channel replying to `message`.
    #[must_use]
    pub fn for_message(
        transport: Arc<dyn MessageTransport>,
        message: &InboundMessage,
        edit: bool,
    ) -> Self {
        Self {
            inner: Arc::new(ResponseInner {
                transport,
                channel: message.channel().clone(),
                channel_kind: message.channel_kind(),
                author: message.author().clone(),
                edit,
                last: Mutex::new(None),
            }),
        }
    }

    /// Returns the target channel.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.inner.channel
    }

    /// Returns the author replies fall back to.
    #[must_use]
    pub fn author(&self) -> &AuthorId {
        &self.inner.author
    }

    /// Returns whether replies edit the previous one.
    #[must_use]
    pub fn edits(&self) -> bool {
        self.inner.edit
    }

    /// Returns the most recent successful delivery.
    pub async fn last_response(&self) -> Option<SentMessage> {
        self.inner.last.lock().await.clone()
    }

    async fn deliver(
        &self,
        previous: Option<&SentMessage>,
        content: &OutboundContent,
    ) -> Result<SentMessage, ResponseError> {
        let transport = &self.inner.transport;
        if let Some(prior) = previous {
            match transport.edit(prior, content).await {
                Ok(edited) => return Ok(edited),
                Err(error) => {
                    tracing::warn!(message = %prior.id, %error, "edit failed, sending new reply");
                }
            }
        }

        let primary = match transport.send(&self.inner.channel, content).await {
            Ok(sent) => return Ok(sent),
            Err(error) => error,
        };
        if self.inner.channel_kind == ChannelKind::Direct {
            return Err(ResponseError::Delivery {
                channel: self.inner.channel.clone(),
                source: primary,
            });
        }

        tracing::warn!(
            channel = %self.inner.channel,
            author = %self.inner.author,
            error = %primary,
            "channel send failed, falling back to direct message"
        );
        transport
            .send_direct(&self.inner.author, content)
            .await
            .map_err(|fallback| ResponseError::DirectFallback {
                channel: self.inner.channel.clone(),
                author: self.inner.author.clone(),
                primary,
                fallback,
            })
    }
}

#[async_trait]
impl Responder for ResponseChannel {
    async fn send(&self, content: OutboundContent, options: SendOptions) -> ResponseResult {
        let mut last = self.inner.last.lock().await;
        let previous = if self.inner.edit && !options.force {
            last.clone()
        } else {
            None
        };
        match self.deliver(previous.as_ref(), &content).await {
            Ok(sent) => {
                *last = Some(sent.clone());
                Ok(Some(sent))
            }
            Err(error) if options.catchall => {
                tracing::warn!(channel = %self.inner.channel, %error, "reply dropped");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}
