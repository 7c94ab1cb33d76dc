//! Loading and hot-reloading command sets.

use parley::dispatch::{
    LoadSummary,
    adapters::{FnCommand, StaticCommandLoader, TextResolver},
    domain::{
        ArgumentDescriptor, CommandDescriptor, DispatchEvent, EventChannel, InvocationStatus,
        LoadFailure,
    },
};
use rstest::rstest;
use serde_json::json;
use tokio::sync::mpsc;

use super::harness::{Harness, message, ping_command, recording_command};

fn nameless() -> CommandDescriptor {
    CommandDescriptor::new(" ", FnCommand::new(|_ctx| async { Ok(json!(null)) }))
        .with_trigger("ghost")
}

#[rstest]
#[tokio::test]
async fn loaded_commands_become_dispatchable() {
    let (runs, _seen) = mpsc::unbounded_channel();
    let loader = StaticCommandLoader::new([ping_command(), recording_command("echo", runs)]);
    let mut harness = Harness::with_commands(Vec::new());

    let summary = harness.dispatcher.load_commands(&loader).await;

    assert_eq!(summary.loaded, vec!["ping", "echo"]);
    assert!(summary.failures.is_empty());
    let events = harness.drain_events();
    assert!(matches!(
        events.as_slice(),
        [DispatchEvent::CommandsLoaded { loaded, failures }]
            if loaded.len() == 2 && failures.is_empty()
    ));
    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds")
        .expect("ping matched");
    assert_eq!(invocation.status(), InvocationStatus::Completed);
}

#[rstest]
#[tokio::test]
async fn broken_sources_are_reported_next_to_good_ones() {
    let loader = StaticCommandLoader::new([ping_command(), nameless()])
        .with_failure(LoadFailure::new("commands/ban.json", "unexpected end of input"));
    let harness = Harness::with_commands(Vec::new());

    let summary = harness.dispatcher.load_commands(&loader).await;

    assert_eq!(summary.loaded, vec!["ping"]);
    assert_eq!(summary.failures.len(), 2);
    assert_eq!(
        summary.failures.first(),
        Some(&LoadFailure::new("commands/ban.json", "unexpected end of input"))
    );
    assert_eq!(harness.dispatcher.registry().names(), vec!["ping"]);
}

#[rstest]
#[tokio::test]
async fn reloading_the_same_set_is_idempotent() {
    let loader = StaticCommandLoader::new([ping_command()]);
    let harness = Harness::with_commands(Vec::new());

    let first: LoadSummary = harness.dispatcher.load_commands(&loader).await;
    let second = harness.dispatcher.load_commands(&loader).await;

    assert_eq!(first, second);
    assert_eq!(harness.dispatcher.registry().len(), 1);
}

#[rstest]
#[tokio::test]
async fn reload_replaces_the_previous_set() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let loader = StaticCommandLoader::new([ping_command()]);
    let mut harness = Harness::with_commands(Vec::new());
    harness.dispatcher.load_commands(&loader).await;

    loader.replace([recording_command("echo", runs)]);
    let summary = harness.dispatcher.load_commands(&loader).await;
    harness.drain_events();

    assert_eq!(summary.loaded, vec!["echo"]);
    let gone = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds");
    assert!(gone.is_none());
    assert_eq!(harness.drain_channels(), vec![EventChannel::Unknown]);
    harness
        .dispatcher
        .dispatch(message("m-2", "x!echo"))
        .await
        .expect("dispatch succeeds")
        .expect("echo matched");
    assert_eq!(seen.try_recv().expect("echo ran"), json!({}));
}

#[rstest]
#[tokio::test]
async fn in_flight_invocation_survives_a_reload() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let ban = recording_command("ban", runs).with_argument(
        ArgumentDescriptor::new("member", TextResolver::new()).with_prompt("Who?"),
    );
    let harness = Harness::with_commands(vec![ban]);
    let dispatcher = harness.dispatcher.clone();
    let pending = tokio::spawn(async move { dispatcher.dispatch(message("m-1", "x!ban")).await });
    harness.transport.wait_for_outbox(1).await;

    let summary = harness
        .dispatcher
        .load_commands(&StaticCommandLoader::default())
        .await;
    assert!(summary.loaded.is_empty());
    harness
        .dispatcher
        .dispatch(message("m-2", "dave"))
        .await
        .expect("reply routed");

    let invocation = pending
        .await
        .expect("dispatch task")
        .expect("dispatch succeeds")
        .expect("ban matched");
    assert_eq!(invocation.status(), InvocationStatus::Completed);
    assert_eq!(seen.try_recv().expect("ban ran"), json!({"member": "dave"}));
}
