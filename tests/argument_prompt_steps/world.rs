//! Shared world state for argument prompting scenarios.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use parley::dispatch::{
    DispatchResult, Dispatcher, DispatcherConfig,
    adapters::{FnCommand, InMemoryTransport},
    domain::{CommandDescriptor, InboundMessage, Invocation},
    ports::{ExecutionContext, MessageTransport},
};
use rstest::fixture;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a step waits for the bot before giving up.
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Scenario world for argument prompting behaviour tests.
pub struct PromptWorld {
    pub transport: Arc<InMemoryTransport>,
    pub dispatcher: Dispatcher,
    pub runs_tx: mpsc::UnboundedSender<Value>,
    pub runs: mpsc::UnboundedReceiver<Value>,
    pub recorded: Vec<Value>,
    pub pending: Option<JoinHandle<DispatchResult>>,
    pub outcome: Option<Option<Invocation>>,
    next_message: u32,
}

impl PromptWorld {
    /// Creates a world whose dispatcher has no prefix and no commands.
    #[must_use]
    pub fn new() -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let dispatcher = build_dispatcher(&transport, DispatcherConfig::default())
            .expect("default configuration should be valid");
        let (runs_tx, runs) = mpsc::unbounded_channel();
        Self {
            transport,
            dispatcher,
            runs_tx,
            runs,
            recorded: Vec::new(),
            pending: None,
            outcome: None,
            next_message: 0,
        }
    }

    /// Replaces the dispatcher with one built from `config`.
    pub fn reconfigure(&mut self, config: DispatcherConfig) -> Result<(), eyre::Report> {
        self.dispatcher =
            build_dispatcher(&self.transport, config).wrap_err("build scenario dispatcher")?;
        Ok(())
    }

    /// Builds the next message from `alice` in `general`.
    pub fn message(&mut self, content: &str) -> InboundMessage {
        self.next_message += 1;
        InboundMessage::new(
            format!("m-{}", self.next_message),
            "alice",
            "general",
            content,
        )
    }

    /// Command recording the arguments it ran with.
    pub fn recording_command(&self, name: &str) -> CommandDescriptor {
        let runs = self.runs_tx.clone();
        CommandDescriptor::new(
            name,
            FnCommand::new(move |ctx: ExecutionContext| {
                let sink = runs.clone();
                async move {
                    let arguments = json!(ctx.arguments.to_json());
                    sink.send(arguments.clone())
                        .expect("scenario world should outlive the command");
                    Ok(arguments)
                }
            }),
        )
        .with_trigger(name)
    }

    /// Moves every recorded run into [`PromptWorld::recorded`].
    pub fn collect_runs(&mut self) {
        while let Ok(run) = self.runs.try_recv() {
            self.recorded.push(run);
        }
    }
}

impl Default for PromptWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn build_dispatcher(
    transport: &Arc<InMemoryTransport>,
    config: DispatcherConfig,
) -> Result<Dispatcher, parley::dispatch::ConfigError> {
    let shared: Arc<dyn MessageTransport> = Arc::clone(transport) as _;
    Dispatcher::builder(shared).with_config(config).build()
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PromptWorld {
    PromptWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Runs `future`, failing the step when the bot takes too long.
pub fn run_bounded<T>(
    what: &str,
    future: impl std::future::Future<Output = T>,
) -> Result<T, eyre::Report> {
    run_async(tokio::time::timeout(STEP_TIMEOUT, future))
        .map_err(|_elapsed| eyre::eyre!("timed out waiting for {what}"))
}
