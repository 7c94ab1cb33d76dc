//! Top-level dispatcher wiring resolution, guarding, validation, argument
//! collection, execution, and lifecycle events.

use mockable::{Clock, DefaultClock};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

use super::{
    ArgumentCollector, CollectionOutcome, CommandResolver, MiddlewareChain, MiddlewareFailure,
    PromptRenderer, ReplyRouter, ResponseChannel, SessionGuard, TriggerRegistry,
};
use crate::dispatch::adapters::BroadcastEventBus;
use crate::dispatch::config::{ConfigError, DispatcherConfig};
use crate::dispatch::domain::{
    CancelReason, CommandDescriptor, CommandFault, DispatchEvent, FailureStage, InboundMessage,
    Invocation, InvocationError, InvocationId, InvocationStatus, LoadFailure, OutboundContent,
    RegistryError, SessionKey, ValidationResult,
};
use crate::dispatch::ports::{
    CommandLoader, CustomResolver, EventSink, ExecutionContext, MessageTransport, Middleware,
    Responder, SendOptions,
};

/// Errors surfaced by [`Dispatcher::dispatch`] when not in silent mode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A command, middleware, or resolver raised a programmer fault.
    #[error("invocation {invocation} of '{command}' failed during {stage}: {fault}")]
    Command {
        /// Invocation identifier.
        invocation: InvocationId,
        /// Command name.
        command: String,
        /// Stage that faulted.
        stage: FailureStage,
        /// The fault.
        fault: CommandFault,
    },
}

/// Result type for dispatch operations.
///
/// `Ok(None)` means the message started no invocation.
pub type DispatchResult = Result<Option<Invocation>, DispatchError>;

/// What a command load produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    /// Names of the registered commands.
    pub loaded: Vec<String>,
    /// Sources that failed to load or register.
    pub failures: Vec<LoadFailure>,
}

enum Abort {
    Rejected {
        middleware: String,
        result: ValidationResult,
    },
    Cancelled(CancelReason),
    Fault {
        stage: FailureStage,
        fault: CommandFault,
    },
}

impl From<MiddlewareFailure> for Abort {
    fn from(failure: MiddlewareFailure) -> Self {
        match failure {
            MiddlewareFailure::Rejected { middleware, result } => {
                Self::Rejected { middleware, result }
            }
            MiddlewareFailure::Fault { middleware, fault } => Self::Fault {
                stage: FailureStage::Middleware,
                fault: CommandFault::new(format!("{middleware}: {fault}")),
            },
        }
    }
}

impl From<InvocationError> for Abort {
    fn from(error: InvocationError) -> Self {
        Self::Fault {
            stage: FailureStage::Lifecycle,
            fault: CommandFault::from_error(&error),
        }
    }
}

struct DispatcherInner<C> {
    config: DispatcherConfig,
    transport: Arc<dyn MessageTransport>,
    events: Arc<dyn EventSink>,
    clock: Arc<C>,
    registry: RwLock<Arc<TriggerRegistry>>,
    resolver: CommandResolver,
    guard: SessionGuard,
    router: ReplyRouter,
    middleware: MiddlewareChain,
    collector: ArgumentCollector,
    renderer: PromptRenderer,
}

/// Command dispatcher.
///
/// Cheap to clone; clones share the registry, session guard, reply router,
/// and event bus, so a transport can hand each inbound message to its own
/// task.
///
/// # Examples
///
/// ```
/// use parley::dispatch::adapters::{FnCommand, InMemoryTransport};
/// use parley::dispatch::domain::{CommandDescriptor, InboundMessage};
/// use parley::dispatch::{Dispatcher, DispatcherConfig};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(InMemoryTransport::new());
/// let dispatcher = Dispatcher::builder(transport)
///     .with_config(DispatcherConfig::default().with_prefix("x!"))
///     .build()?;
/// dispatcher.register(
///     CommandDescriptor::new("ping", FnCommand::new(|_ctx| async { Ok(json!("pong")) }))
///         .with_trigger("ping"),
/// )?;
///
/// let message = InboundMessage::new("m-1", "alice", "general", "x!ping");
/// let invocation = dispatcher.dispatch(message).await?.expect("ping matched");
/// assert_eq!(invocation.descriptor().name(), "ping");
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    inner: Arc<DispatcherInner<C>>,
}

impl<C> Clone for Dispatcher<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for Dispatcher<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("commands", &self.registry().names())
            .field("active_sessions", &self.inner.guard.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher<DefaultClock> {
    /// Starts building a dispatcher replying through `transport`.
    #[must_use]
    pub fn builder(transport: Arc<dyn MessageTransport>) -> DispatcherBuilder<DefaultClock> {
        DispatcherBuilder::new(transport)
    }
}

impl<C> Dispatcher<C>
where
    C: Clock + Send + Sync,
{
    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Returns the current registry snapshot.
    #[must_use]
    pub fn registry(&self) -> Arc<TriggerRegistry> {
        Arc::clone(
            &self
                .inner
                .registry
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.inner.events.subscribe()
    }

    /// Returns whether `session` has an invocation in flight.
    #[must_use]
    pub fn is_active(&self, session: &SessionKey) -> bool {
        self.inner.guard.contains(session)
    }

    /// Returns whether `session` is suspended waiting for a prompt answer.
    #[must_use]
    pub fn is_awaiting_reply(&self, session: &SessionKey) -> bool {
        self.inner.router.is_waiting(session)
    }

    /// Registers one command into a new registry snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the descriptor is malformed or its
    /// literal triggers collide and overlap is disallowed.
    pub fn register(&self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        let mut slot = self
            .inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = TriggerRegistry::clone(&slot);
        next.register(descriptor)?;
        *slot = Arc::new(next);
        Ok(())
    }

    /// Replaces the command set with whatever `loader` produces.
    ///
    /// Commands that fail to register join the loader's failures; the rest
    /// are swapped in atomically. In-flight invocations keep the descriptors
    /// they started with.
    pub async fn load_commands(&self, loader: &dyn CommandLoader) -> LoadSummary {
        let report = loader.load().await;
        let (registry, errors) =
            TriggerRegistry::from_descriptors(self.inner.config.overlap_policy(), report.commands);

        let mut failures = report.failures;
        failures.extend(
            errors
                .iter()
                .map(|error| LoadFailure::new(error.command(), error.to_string())),
        );
        for failure in &failures {
            tracing::warn!(
                source = %failure.source,
                reason = %failure.reason,
                "command failed to load"
            );
        }

        let loaded = registry.names();
        *self
            .inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(registry);
        tracing::info!(
            loaded = loaded.len(),
            failed = failures.len(),
            "commands loaded"
        );

        self.inner.events.publish(DispatchEvent::CommandsLoaded {
            loaded: loaded.clone(),
            failures: failures.clone(),
        });
        LoadSummary { loaded, failures }
    }

    /// Cancels the invocation active in `session`.
    ///
    /// A pending prompt is answered with the cancellation at once; an
    /// invocation still validating or between arguments is stopped before
    /// its command executes. Once the command is executing the request has
    /// no effect. Returns `false` when no invocation is active there.
    pub fn cancel(&self, session: &SessionKey, reason: impl Into<String>) -> bool {
        if !self.inner.guard.contains(session) {
            return false;
        }
        self.inner.router.cancel(session, reason);
        true
    }

    /// Dispatches an inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for programmer faults when silent mode is
    /// off; in silent mode faults are reported only through events.
    pub async fn dispatch(&self, message: InboundMessage) -> DispatchResult {
        if self.skips_automated(&message) {
            return Ok(None);
        }
        let Some(unrouted) = self.route_reply(message) else {
            return Ok(None);
        };
        self.run_message(unrouted, None).await
    }

    /// Dispatches a message using `body` in place of prefix handling.
    ///
    /// # Errors
    ///
    /// Same as [`Dispatcher::dispatch`].
    pub async fn dispatch_with_body(
        &self,
        message: InboundMessage,
        body: impl Into<String> + Send,
    ) -> DispatchResult {
        if self.skips_automated(&message) {
            return Ok(None);
        }
        let Some(unrouted) = self.route_reply(message) else {
            return Ok(None);
        };
        self.run_message(unrouted, Some(body.into())).await
    }

    fn route_reply(&self, message: InboundMessage) -> Option<InboundMessage> {
        match self.inner.router.deliver(message) {
            Ok(()) => {
                tracing::debug!("message routed to a pending prompt");
                None
            }
            Err(unrouted) => Some(unrouted),
        }
    }

    fn skips_automated(&self, message: &InboundMessage) -> bool {
        let skip = self.inner.config.ignore_automated && message.is_automated();
        if skip {
            tracing::debug!(message = %message.id(), "ignoring automated author");
        }
        skip
    }

    async fn run_message(
        &self,
        message: InboundMessage,
        override_body: Option<String>,
    ) -> DispatchResult {
        let registry = self.registry();
        let Some(matched) =
            self.inner
                .resolver
                .resolve(&message, &registry, override_body.as_deref())
        else {
            tracing::debug!(message = %message.id(), "no command matched");
            self.inner.events.publish(DispatchEvent::Unknown {
                message_id: message.id().clone(),
                author: message.author().clone(),
                channel: message.channel().clone(),
                content: message.content().to_owned(),
            });
            return Ok(None);
        };

        let session = message.session_key();
        let Some(_permit) = self.inner.guard.acquire(&session) else {
            tracing::debug!(session = %session, "session busy, duplicate ignored");
            return Ok(None);
        };
        self.inner.router.clear_cancellation(&session);

        let mut invocation = Invocation::new(matched, message, &*self.inner.clock);
        let response = ResponseChannel::for_message(
            Arc::clone(&self.inner.transport),
            invocation.message(),
            self.inner.config.edit_responses,
        );
        tracing::info!(
            invocation = %invocation.id(),
            command = invocation.descriptor().name(),
            session = %session,
            "invocation started"
        );
        self.inner.events.publish(DispatchEvent::Started {
            invocation: invocation.summary(),
        });

        let outcome = self.execute(&mut invocation, &response).await;
        self.inner.router.clear_cancellation(&session);
        self.finish(invocation, outcome, &response).await
    }

    async fn execute(
        &self,
        invocation: &mut Invocation,
        response: &ResponseChannel,
    ) -> Result<Value, Abort> {
        invocation.transition_to(InvocationStatus::Validating)?;
        let command_middleware = invocation.descriptor().middleware();
        self.inner
            .middleware
            .run(invocation, &command_middleware)
            .await?;

        if !invocation.descriptor().arguments().is_empty() {
            invocation.transition_to(InvocationStatus::CollectingArgs)?;
            match self.inner.collector.collect(invocation, response).await {
                CollectionOutcome::Completed => {}
                CollectionOutcome::Cancelled(reason) => return Err(Abort::Cancelled(reason)),
                CollectionOutcome::Failed(fault) => {
                    return Err(Abort::Fault {
                        stage: FailureStage::ArgumentResolution,
                        fault,
                    });
                }
            }
        }

        if let Some(reason) = self.inner.router.take_cancellation(invocation.session()) {
            return Err(Abort::Cancelled(CancelReason::Requested {
                argument: String::new(),
                reason,
            }));
        }
        invocation.transition_to(InvocationStatus::Executing)?;
        let ctx = ExecutionContext::from_invocation(invocation, Arc::new(response.clone()));
        invocation
            .descriptor()
            .command()
            .execute(ctx)
            .await
            .map_err(|fault| Abort::Fault {
                stage: FailureStage::Execution,
                fault,
            })
    }

    async fn finish(
        &self,
        mut invocation: Invocation,
        outcome: Result<Value, Abort>,
        response: &ResponseChannel,
    ) -> DispatchResult {
        match outcome {
            Ok(result) => {
                settle(&mut invocation, InvocationStatus::Completed);
                tracing::info!(invocation = %invocation.id(), "invocation finished");
                self.inner.events.publish(DispatchEvent::Finished {
                    invocation: invocation.summary(),
                    result,
                });
                Ok(Some(invocation))
            }
            Err(Abort::Rejected { middleware, result }) => {
                settle(&mut invocation, InvocationStatus::Failed);
                tracing::info!(
                    invocation = %invocation.id(),
                    middleware = %middleware,
                    suppressed = result.is_suppressed(),
                    "invocation rejected"
                );
                if self.inner.config.reply_on_invalid && !result.is_suppressed() {
                    if let Some(reason) = result.reason() {
                        notify(response, OutboundContent::error(reason)).await;
                    }
                }
                self.inner.events.publish(DispatchEvent::Invalid {
                    invocation: invocation.summary(),
                    middleware,
                    reason: result.reason().map(str::to_owned),
                });
                Ok(Some(invocation))
            }
            Err(Abort::Cancelled(reason)) => {
                settle(&mut invocation, InvocationStatus::Cancelled);
                tracing::info!(
                    invocation = %invocation.id(),
                    reason = reason.code(),
                    argument = reason.argument(),
                    "invocation cancelled"
                );
                let text = self
                    .inner
                    .renderer
                    .render_cancellation(invocation.descriptor().name(), &reason);
                notify(response, OutboundContent::error(text)).await;
                self.inner.events.publish(DispatchEvent::Cancelled {
                    invocation: invocation.summary(),
                    reason,
                });
                Ok(Some(invocation))
            }
            Err(Abort::Fault { stage, fault }) => {
                settle(&mut invocation, InvocationStatus::Failed);
                tracing::error!(
                    invocation = %invocation.id(),
                    command = invocation.descriptor().name(),
                    stage = %stage,
                    error = %fault,
                    "invocation failed"
                );
                self.inner.events.publish(DispatchEvent::Failed {
                    invocation: invocation.summary(),
                    stage,
                    error: fault.to_string(),
                });
                if self.inner.config.silent {
                    return Ok(Some(invocation));
                }
                Err(DispatchError::Command {
                    invocation: invocation.id(),
                    command: invocation.descriptor().name().to_owned(),
                    stage,
                    fault,
                })
            }
        }
    }
}

fn settle(invocation: &mut Invocation, status: InvocationStatus) {
    if let Err(error) = invocation.transition_to(status) {
        tracing::error!(invocation = %invocation.id(), %error, "could not settle invocation");
    }
}

async fn notify(response: &ResponseChannel, content: OutboundContent) {
    if let Err(error) = response
        .send(content, SendOptions::default().catchall())
        .await
    {
        tracing::warn!(%error, "notification not delivered");
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder<C = DefaultClock>
where
    C: Clock + Send + Sync,
{
    transport: Arc<dyn MessageTransport>,
    config: DispatcherConfig,
    clock: Arc<C>,
    events: Option<Arc<dyn EventSink>>,
    middleware: Vec<Arc<dyn Middleware>>,
    custom: Vec<Arc<dyn CustomResolver>>,
}

impl<C> fmt::Debug for DispatcherBuilder<C>
where
    C: Clock + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("config", &self.config)
            .field("middleware", &self.middleware.len())
            .field("custom", &self.custom.len())
            .finish_non_exhaustive()
    }
}

impl DispatcherBuilder<DefaultClock> {
    /// Creates a builder with the default configuration and system clock.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            config: DispatcherConfig::default(),
            clock: Arc::new(DefaultClock),
            events: None,
            middleware: Vec::new(),
            custom: Vec::new(),
        }
    }
}

impl<C> DispatcherBuilder<C>
where
    C: Clock + Send + Sync,
{
    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock stamping invocations.
    #[must_use]
    pub fn with_clock<K>(self, clock: Arc<K>) -> DispatcherBuilder<K>
    where
        K: Clock + Send + Sync,
    {
        DispatcherBuilder {
            transport: self.transport,
            config: self.config,
            clock,
            events: self.events,
            middleware: self.middleware,
            custom: self.custom,
        }
    }

    /// Publishes lifecycle events through `events` instead of a private bus.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Appends global middleware.
    #[must_use]
    pub fn with_global_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends a custom command resolver.
    #[must_use]
    pub fn with_custom_resolver(mut self, resolver: impl CustomResolver + 'static) -> Self {
        self.custom.push(Arc::new(resolver));
        self
    }

    /// Builds the dispatcher with an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a prefix pattern, the cancel keyword, or
    /// a message template is invalid.
    pub fn build(self) -> Result<Dispatcher<C>, ConfigError> {
        let config = self.config;
        let prefixes = config.compile_prefixes()?;
        let cancel = config.cancel_pattern()?;
        let renderer = config.prompt_renderer()?;

        let resolver = self
            .custom
            .into_iter()
            .fold(CommandResolver::new(prefixes), CommandResolver::with_custom);
        let router = ReplyRouter::new();
        let collector = ArgumentCollector::new(
            router.clone(),
            renderer.clone(),
            config.argument_timeout(),
            cancel,
        );
        let events = self
            .events
            .unwrap_or_else(|| Arc::new(BroadcastEventBus::new(config.event_capacity)));

        Ok(Dispatcher {
            inner: Arc::new(DispatcherInner {
                registry: RwLock::new(Arc::new(TriggerRegistry::new(config.overlap_policy()))),
                config,
                transport: self.transport,
                events,
                clock: self.clock,
                resolver,
                guard: SessionGuard::new(),
                router,
                middleware: MiddlewareChain::new(self.middleware),
                collector,
                renderer,
            }),
        })
    }
}
