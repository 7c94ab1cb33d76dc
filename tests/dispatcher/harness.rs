//! Shared fixtures for dispatcher integration tests.

use std::sync::Arc;

use parley::dispatch::{
    Dispatcher, DispatcherBuilder, DispatcherConfig,
    adapters::{FnCommand, InMemoryTransport},
    domain::{CommandDescriptor, CommandFault, DispatchEvent, EventChannel, InboundMessage},
    ports::{ExecutionContext, MessageTransport},
};
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};

/// Dispatcher wired to an in-memory transport with an event subscription.
pub struct Harness {
    /// Transport recording every reply.
    pub transport: Arc<InMemoryTransport>,
    /// Dispatcher under test.
    pub dispatcher: Dispatcher,
    /// Events published since the harness was built.
    pub events: broadcast::Receiver<DispatchEvent>,
}

impl Harness {
    /// Builds a dispatcher with `config` and registers `commands`.
    ///
    /// # Panics
    ///
    /// Panics when the configuration or a command is invalid.
    pub fn new(config: DispatcherConfig, commands: Vec<CommandDescriptor>) -> Self {
        Self::customised(commands, |builder| builder.with_config(config))
    }

    /// Builds a dispatcher shaped by `customise` and registers `commands`.
    ///
    /// # Panics
    ///
    /// Panics when the configuration or a command is invalid.
    pub fn customised(
        commands: Vec<CommandDescriptor>,
        customise: impl FnOnce(DispatcherBuilder) -> DispatcherBuilder,
    ) -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let shared: Arc<dyn MessageTransport> = Arc::clone(&transport) as _;
        let dispatcher = customise(Dispatcher::builder(shared))
            .build()
            .expect("configuration should be valid");
        for command in commands {
            dispatcher
                .register(command)
                .expect("command should register");
        }
        let events = dispatcher.subscribe();
        Self {
            transport,
            dispatcher,
            events,
        }
    }

    /// Builds a dispatcher listening on the `x!` prefix.
    pub fn with_commands(commands: Vec<CommandDescriptor>) -> Self {
        Self::new(default_config(), commands)
    }

    /// Returns every event received so far.
    pub fn drain_events(&mut self) -> Vec<DispatchEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Returns the channels of every event received so far.
    pub fn drain_channels(&mut self) -> Vec<EventChannel> {
        self.drain_events()
            .iter()
            .map(DispatchEvent::channel)
            .collect()
    }
}

/// Configuration shared by most tests.
pub fn default_config() -> DispatcherConfig {
    DispatcherConfig::default().with_prefix("x!")
}

/// Message from `alice` in `general`.
pub fn message(id: &str, content: &str) -> InboundMessage {
    InboundMessage::new(id, "alice", "general", content)
}

/// Message from another author in `general`.
pub fn message_from(author: &str, id: &str, content: &str) -> InboundMessage {
    InboundMessage::new(id, author, "general", content)
}

/// Command that reports the arguments it ran with on `runs` and returns
/// them as its result.
pub fn recording_command(name: &str, runs: mpsc::UnboundedSender<Value>) -> CommandDescriptor {
    CommandDescriptor::new(
        name,
        FnCommand::new(move |ctx: ExecutionContext| {
            let sink = runs.clone();
            async move {
                let arguments = json!(ctx.arguments.to_json());
                sink.send(arguments.clone())
                    .expect("run recorder should outlive the dispatcher");
                Ok(arguments)
            }
        }),
    )
    .with_trigger(name)
}

/// Command that replies `pong`.
pub fn ping_command() -> CommandDescriptor {
    CommandDescriptor::new(
        "ping",
        FnCommand::new(|ctx: ExecutionContext| async move {
            match ctx.response.reply("pong").await {
                Ok(_) => Ok(json!("pong")),
                Err(error) => Err(CommandFault::new(error.to_string())),
            }
        }),
    )
    .with_trigger("ping")
}
