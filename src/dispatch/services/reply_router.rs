//! Routes prompt answers and cancellations to suspended invocations.
//!
//! An invocation awaiting a prompt answer registers a waiter for its session
//! key before the prompt goes out. The next inbound message from that session
//! is handed to the waiter instead of being dispatched as a new command.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::dispatch::domain::{InboundMessage, SessionKey};

/// What a waiter receives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplyEvent {
    Reply(InboundMessage),
    Cancel(String),
}

/// How waiting for a reply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The author answered.
    Reply(InboundMessage),
    /// The session was cancelled programmatically with this reason.
    Cancelled(String),
    /// No answer arrived in time.
    TimedOut,
    /// The router dropped the waiter without an answer.
    Closed,
}

#[derive(Debug)]
struct Waiting {
    token: u64,
    tx: oneshot::Sender<ReplyEvent>,
}

#[derive(Debug, Default)]
struct RouterState {
    waiting: HashMap<SessionKey, Waiting>,
    cancellations: HashMap<SessionKey, String>,
    next_token: u64,
}

/// Per-dispatcher map of sessions awaiting a reply.
#[derive(Debug, Clone, Default)]
pub struct ReplyRouter {
    state: Arc<Mutex<RouterState>>,
}

impl ReplyRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers interest in the next message of `key`.
    ///
    /// A newer registration for the same key replaces the older one.
    #[must_use]
    pub fn expect_reply(&self, key: &SessionKey) -> ReplyWaiter {
        let (tx, rx) = oneshot::channel();
        let token = {
            let mut state = self.lock();
            state.next_token += 1;
            let token = state.next_token;
            state.waiting.insert(key.clone(), Waiting { token, tx });
            token
        };
        ReplyWaiter {
            router: self.clone(),
            key: key.clone(),
            token,
            rx,
        }
    }

    /// Returns whether a waiter is registered for `key`.
    #[must_use]
    pub fn is_waiting(&self, key: &SessionKey) -> bool {
        self.lock().waiting.contains_key(key)
    }

    /// Hands `message` to the waiter of its session.
    ///
    /// # Errors
    ///
    /// Returns the message back when no live waiter exists, so the caller
    /// can dispatch it normally.
    pub fn deliver(&self, message: InboundMessage) -> Result<(), InboundMessage> {
        let Some(waiting) = self.lock().waiting.remove(&message.session_key()) else {
            return Err(message);
        };
        match waiting.tx.send(ReplyEvent::Reply(message)) {
            Err(ReplyEvent::Reply(returned)) => Err(returned),
            Ok(()) | Err(ReplyEvent::Cancel(_)) => Ok(()),
        }
    }

    /// Cancels the suspended invocation of `key`.
    ///
    /// When nothing is waiting yet the reason is kept until the invocation
    /// next checks for it.
    pub fn cancel(&self, key: &SessionKey, reason: impl Into<String>) {
        let mut state = self.lock();
        let unsent = match state.waiting.remove(key) {
            Some(waiting) => match waiting.tx.send(ReplyEvent::Cancel(reason.into())) {
                Ok(()) => return,
                Err(event) => event,
            },
            None => ReplyEvent::Cancel(reason.into()),
        };
        if let ReplyEvent::Cancel(pending) = unsent {
            state.cancellations.insert(key.clone(), pending);
        }
    }

    /// Takes a pending cancellation for `key`.
    #[must_use]
    pub fn take_cancellation(&self, key: &SessionKey) -> Option<String> {
        self.lock().cancellations.remove(key)
    }

    /// Forgets any pending cancellation for `key`.
    pub fn clear_cancellation(&self, key: &SessionKey) {
        self.lock().cancellations.remove(key);
    }

    fn forget(&self, key: &SessionKey, token: u64) {
        let mut state = self.lock();
        if state
            .waiting
            .get(key)
            .is_some_and(|waiting| waiting.token == token)
        {
            state.waiting.remove(key);
        }
    }
}

/// Registration for one reply; unregisters itself when dropped.
#[derive(Debug)]
pub struct ReplyWaiter {
    router: ReplyRouter,
    key: SessionKey,
    token: u64,
    rx: oneshot::Receiver<ReplyEvent>,
}

impl ReplyWaiter {
    /// Returns the session being waited on.
    #[must_use]
    pub const fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Waits for the reply, bounded by `timeout`.
    pub async fn wait(mut self, timeout: Duration) -> WaitOutcome {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(ReplyEvent::Reply(message))) => WaitOutcome::Reply(message),
            Ok(Ok(ReplyEvent::Cancel(reason))) => WaitOutcome::Cancelled(reason),
            Ok(Err(_)) => WaitOutcome::Closed,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

impl Drop for ReplyWaiter {
    fn drop(&mut self) {
        self.router.forget(&self.key, self.token);
    }
}
