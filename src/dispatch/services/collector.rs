//! Argument collection state machine.
//!
//! Each declared argument moves through `MatchInline -> Resolve` and, when
//! the body does not supply a usable value, `Prompt -> AwaitReply -> Resolve`
//! until it is resolved, skipped, cancelled, or times out. Suspension keeps
//! its progress in an explicit cursor so nothing depends on where a future
//! happened to be parked.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::prompt::{PromptContext, PromptRenderer};
use super::reply_router::{ReplyRouter, ReplyWaiter, WaitOutcome};
use super::response::ResponseChannel;
use crate::dispatch::domain::{
    ArgumentDescriptor, CancelPattern, CancelReason, CommandFault, Invocation, OutboundContent,
};
use crate::dispatch::ports::{ResolveContext, ResolveError, Responder, SendOptions};

/// How collection for a whole invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// Every required argument resolved.
    Completed,
    /// Collection stopped; the command must not run.
    Cancelled(CancelReason),
    /// A resolver or prompt delivery faulted.
    Failed(CommandFault),
}

enum State {
    MatchInline,
    Resolve(Option<String>),
    Prompt,
    AwaitReply(ReplyWaiter),
}

enum ArgumentOutcome {
    Resolved(Value),
    Skipped,
    Stopped(CollectionOutcome),
}

enum Step {
    Next(State),
    Done(ArgumentOutcome),
}

/// Progress on the current argument, kept between states.
#[derive(Debug, Default)]
struct Cursor {
    attempt: u32,
    prompts: u32,
    pending_reason: Option<String>,
}

/// Drives argument collection for invocations.
#[derive(Debug, Clone)]
pub struct ArgumentCollector {
    router: ReplyRouter,
    renderer: PromptRenderer,
    default_timeout: Duration,
    default_cancel: CancelPattern,
}

impl ArgumentCollector {
    /// Creates a collector prompting through `renderer` and receiving
    /// replies through `router`.
    #[must_use]
    pub const fn new(
        router: ReplyRouter,
        renderer: PromptRenderer,
        default_timeout: Duration,
        default_cancel: CancelPattern,
    ) -> Self {
        Self {
            router,
            renderer,
            default_timeout,
            default_cancel,
        }
    }

    /// Returns the reply timeout used when an argument sets none.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Resolves every declared argument of `invocation` in order, threading
    /// the remaining body through the matchers.
    pub async fn collect(
        &self,
        invocation: &mut Invocation,
        response: &ResponseChannel,
    ) -> CollectionOutcome {
        let descriptor = Arc::clone(invocation.descriptor());
        for argument in descriptor.arguments() {
            match self.collect_argument(invocation, argument, response).await {
                ArgumentOutcome::Resolved(value) => {
                    tracing::debug!(
                        invocation = %invocation.id(),
                        argument = argument.key(),
                        "argument resolved"
                    );
                    invocation.insert_argument(argument.key(), value);
                }
                ArgumentOutcome::Skipped => {
                    tracing::debug!(
                        invocation = %invocation.id(),
                        argument = argument.key(),
                        "optional argument skipped"
                    );
                }
                ArgumentOutcome::Stopped(outcome) => return outcome,
            }
        }
        CollectionOutcome::Completed
    }

    async fn collect_argument(
        &self,
        invocation: &mut Invocation,
        argument: &ArgumentDescriptor,
        response: &ResponseChannel,
    ) -> ArgumentOutcome {
        let mut cursor = Cursor::default();
        let mut state = State::MatchInline;
        loop {
            if let Some(reason) = self.router.take_cancellation(invocation.session()) {
                return stopped(CancelReason::Requested {
                    argument: argument.key().to_owned(),
                    reason,
                });
            }
            state = match state {
                State::MatchInline => match argument.matcher().extract(invocation.body()) {
                    Some(matched) => {
                        invocation.set_body(matched.remainder);
                        State::Resolve(Some(matched.candidate))
                    }
                    None => State::Resolve(None),
                },
                State::Resolve(candidate) => {
                    match self.resolve(invocation, argument, &mut cursor, candidate).await {
                        Step::Next(next) => next,
                        Step::Done(outcome) => return outcome,
                    }
                }
                State::Prompt => {
                    match self.prompt(invocation, argument, &mut cursor, response).await {
                        Ok(waiter) => State::AwaitReply(waiter),
                        Err(outcome) => return outcome,
                    }
                }
                State::AwaitReply(waiter) => match self.await_reply(argument, waiter).await {
                    Ok(reply) => {
                        cursor.attempt = cursor.attempt.saturating_add(1);
                        State::Resolve(Some(reply))
                    }
                    Err(outcome) => return outcome,
                },
            };
        }
    }

    async fn resolve(
        &self,
        invocation: &Invocation,
        argument: &ArgumentDescriptor,
        cursor: &mut Cursor,
        candidate: Option<String>,
    ) -> Step {
        let supplied = candidate.is_some();
        let text = candidate.unwrap_or_default();
        let ctx = ResolveContext {
            message: invocation.message(),
            arguments: invocation.arguments(),
            descriptor: argument,
            attempt: cursor.attempt,
        };
        match argument.resolver().resolve(&text, &ctx).await {
            Ok(Some(value)) => Step::Done(ArgumentOutcome::Resolved(value)),
            Ok(None) | Err(ResolveError::Rejected(_))
                if cursor.attempt == 0 && argument.is_optional() && !supplied =>
            {
                Step::Done(ArgumentOutcome::Skipped)
            }
            Ok(None) => Step::Next(State::Prompt),
            Err(ResolveError::Rejected(reason)) => {
                cursor.pending_reason = Some(reason);
                Step::Next(State::Prompt)
            }
            Err(ResolveError::Fault(fault)) => Step::Done(failed(fault)),
        }
    }

    async fn prompt(
        &self,
        invocation: &Invocation,
        argument: &ArgumentDescriptor,
        cursor: &mut Cursor,
        response: &ResponseChannel,
    ) -> Result<ReplyWaiter, ArgumentOutcome> {
        let Some(prompt) = argument.prompt() else {
            return Err(stopped(CancelReason::MissingArgument {
                argument: argument.key().to_owned(),
            }));
        };
        let ctx = PromptContext {
            command: invocation.descriptor().name(),
            argument: argument.key(),
            keyword: self.cancel_pattern(argument).keyword_text(),
            timeout: self.timeout(argument),
            arguments: invocation.arguments(),
        };
        let rendered = match cursor.pending_reason.take() {
            Some(reason) => self.renderer.render_raw(&reason, &ctx),
            None if cursor.prompts == 0 => self.renderer.render_prompt(prompt, &ctx),
            None => self
                .renderer
                .render_prompt(argument.reprompt().unwrap_or(prompt), &ctx),
        };
        let text = rendered.map_err(|error| failed(CommandFault::from_error(&error)))?;

        // Register before sending so an instant reply cannot slip past.
        let waiter = self.router.expect_reply(invocation.session());
        response
            .send(OutboundContent::plain(text), SendOptions::default())
            .await
            .map_err(|error| {
                failed(CommandFault::new(format!(
                    "prompt for '{}' could not be delivered: {error}",
                    argument.key()
                )))
            })?;
        cursor.prompts = cursor.prompts.saturating_add(1);
        Ok(waiter)
    }

    async fn await_reply(
        &self,
        argument: &ArgumentDescriptor,
        waiter: ReplyWaiter,
    ) -> Result<String, ArgumentOutcome> {
        let timeout = self.timeout(argument);
        let cancel = self.cancel_pattern(argument);
        match waiter.wait(timeout).await {
            WaitOutcome::Reply(reply) if cancel.is_match(reply.content()) => {
                Err(stopped(CancelReason::UserCancelled {
                    argument: argument.key().to_owned(),
                }))
            }
            WaitOutcome::Reply(reply) => Ok(reply.content().trim().to_owned()),
            WaitOutcome::Cancelled(reason) => Err(stopped(CancelReason::Requested {
                argument: argument.key().to_owned(),
                reason,
            })),
            WaitOutcome::TimedOut => Err(stopped(CancelReason::TimedOut {
                argument: argument.key().to_owned(),
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })),
            WaitOutcome::Closed => Err(failed(CommandFault::new(format!(
                "reply channel for '{}' closed",
                argument.key()
            )))),
        }
    }

    fn timeout(&self, argument: &ArgumentDescriptor) -> Duration {
        argument.timeout().unwrap_or(self.default_timeout)
    }

    fn cancel_pattern<'a>(&'a self, argument: &'a ArgumentDescriptor) -> &'a CancelPattern {
        argument.cancel_pattern().unwrap_or(&self.default_cancel)
    }
}

const fn stopped(reason: CancelReason) -> ArgumentOutcome {
    ArgumentOutcome::Stopped(CollectionOutcome::Cancelled(reason))
}

const fn failed(fault: CommandFault) -> ArgumentOutcome {
    ArgumentOutcome::Stopped(CollectionOutcome::Failed(fault))
}
