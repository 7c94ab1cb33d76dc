//! In-memory transport recording every delivery.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::dispatch::{
    domain::{AuthorId, ChannelId, OutboundContent, SentMessage},
    ports::{MessageTransport, TransportError, TransportResult},
};

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxEntry {
    /// A new message in a channel.
    Sent(SentMessage),
    /// An in-place edit of an earlier message.
    Edited(SentMessage),
    /// A direct message to an author.
    Direct {
        /// Recipient.
        author: AuthorId,
        /// Delivered message.
        message: SentMessage,
    },
}

impl OutboxEntry {
    /// Returns the delivered message.
    #[must_use]
    pub const fn message(&self) -> &SentMessage {
        match self {
            Self::Sent(message) | Self::Edited(message) | Self::Direct { message, .. } => message,
        }
    }

    /// Returns the delivered text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.message().content.text
    }
}

#[derive(Debug, Default)]
struct TransportState {
    outbox: Vec<OutboxEntry>,
    failing_channels: HashSet<ChannelId>,
    direct_disabled: bool,
    next_id: u64,
}

/// Thread-safe transport that keeps deliveries in memory.
///
/// Tests can make a channel refuse posts, disable direct messages, and await
/// outbox growth without sleeping.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<TransportState>>,
    grown: Arc<Notify>,
}

impl fmt::Debug for InMemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryTransport")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl InMemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every send to `channel` fail.
    pub fn fail_channel(&self, channel: impl Into<ChannelId>) {
        self.lock().failing_channels.insert(channel.into());
    }

    /// Makes every direct message fail.
    pub fn disable_direct(&self) {
        self.lock().direct_disabled = true;
    }

    /// Returns a snapshot of the deliveries so far.
    #[must_use]
    pub fn outbox(&self) -> Vec<OutboxEntry> {
        self.lock().outbox.clone()
    }

    /// Returns the delivered texts in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.lock()
            .outbox
            .iter()
            .map(|entry| entry.text().to_owned())
            .collect()
    }

    /// Waits until at least `count` deliveries were recorded.
    pub async fn wait_for_outbox(&self, count: usize) -> Vec<OutboxEntry> {
        loop {
            let notified = self.grown.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let state = self.lock();
                if state.outbox.len() >= count {
                    return state.outbox.clone();
                }
            }
            notified.await;
        }
    }

    fn record(
        &self,
        channel: ChannelId,
        content: &OutboundContent,
        wrap: impl FnOnce(SentMessage) -> OutboxEntry,
    ) -> SentMessage {
        let message = {
            let mut state = self.lock();
            state.next_id += 1;
            let message = SentMessage::new(
                format!("out-{}", state.next_id),
                channel,
                content.clone(),
            );
            state.outbox.push(wrap(message.clone()));
            message
        };
        self.grown.notify_waiters();
        message
    }
}

#[async_trait]
impl MessageTransport for InMemoryTransport {
    async fn send(
        &self,
        channel: &ChannelId,
        content: &OutboundContent,
    ) -> TransportResult<SentMessage> {
        if self.lock().failing_channels.contains(channel) {
            return Err(TransportError::Forbidden(channel.clone()));
        }
        Ok(self.record(channel.clone(), content, OutboxEntry::Sent))
    }

    async fn edit(
        &self,
        previous: &SentMessage,
        content: &OutboundContent,
    ) -> TransportResult<SentMessage> {
        if self.lock().failing_channels.contains(&previous.channel) {
            return Err(TransportError::Gone(previous.id.to_string()));
        }
        let edited = SentMessage::new(
            previous.id.clone(),
            previous.channel.clone(),
            content.clone(),
        );
        self.lock().outbox.push(OutboxEntry::Edited(edited.clone()));
        self.grown.notify_waiters();
        Ok(edited)
    }

    async fn send_direct(
        &self,
        author: &AuthorId,
        content: &OutboundContent,
    ) -> TransportResult<SentMessage> {
        if self.lock().direct_disabled {
            return Err(TransportError::DirectUnavailable(author.clone()));
        }
        let channel = ChannelId::new(format!("dm-{author}"));
        let recipient = author.clone();
        Ok(self.record(channel, content, move |message| OutboxEntry::Direct {
            author: recipient,
            message,
        }))
    }
}
