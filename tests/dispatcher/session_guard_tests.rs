//! One invocation per author and channel, and programmatic cancellation.

use std::sync::Arc;

use async_trait::async_trait;
use parley::dispatch::{
    adapters::{FnCommand, TextResolver},
    domain::{
        ArgumentDescriptor, AuthorId, CancelReason, ChannelId, CommandDescriptor, CommandFault,
        DispatchEvent, EventChannel, Invocation, InvocationStatus, SessionKey, ValidationResult,
    },
    ports::{ExecutionContext, Middleware},
};
use rstest::rstest;
use serde_json::json;
use tokio::sync::{Semaphore, mpsc};

use super::harness::{Harness, default_config, message, message_from, recording_command};

/// Middleware that signals on `entered` and then waits for a permit from
/// `release` before accepting the invocation.
struct HoldingMiddleware {
    entered: mpsc::UnboundedSender<()>,
    release: Arc<Semaphore>,
}

#[async_trait]
impl Middleware for HoldingMiddleware {
    fn name(&self) -> &str {
        "holding"
    }

    async fn run(&self, _invocation: &mut Invocation) -> Result<ValidationResult, CommandFault> {
        self.entered
            .send(())
            .expect("entry recorder should be alive");
        drop(self.release.acquire().await.expect("gate should stay open"));
        Ok(ValidationResult::valid())
    }
}

/// Command that reports its author on `started` and then blocks until
/// `release` hands out a permit.
fn blocking_command(
    started: mpsc::UnboundedSender<String>,
    release: Arc<Semaphore>,
) -> CommandDescriptor {
    CommandDescriptor::new(
        "slow",
        FnCommand::new(move |ctx: ExecutionContext| {
            let report = started.clone();
            let gate = Arc::clone(&release);
            async move {
                report
                    .send(ctx.message.author().to_string())
                    .expect("start recorder should be alive");
                drop(gate.acquire().await.expect("gate should stay open"));
                Ok(json!(null))
            }
        }),
    )
    .with_trigger("slow")
}

fn alice_in_general() -> SessionKey {
    SessionKey::new(AuthorId::new("alice"), ChannelId::new("general"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_invocation_in_a_busy_session_is_dropped() {
    let (started, mut starts) = mpsc::unbounded_channel();
    let release = Arc::new(Semaphore::new(0));
    let mut harness =
        Harness::with_commands(vec![blocking_command(started, Arc::clone(&release))]);
    let dispatcher = harness.dispatcher.clone();
    let first = tokio::spawn(async move { dispatcher.dispatch(message("m-1", "x!slow")).await });
    assert_eq!(starts.recv().await.as_deref(), Some("alice"));

    let duplicate = harness
        .dispatcher
        .dispatch(message("m-2", "x!slow"))
        .await
        .expect("dispatch succeeds");
    assert!(duplicate.is_none());
    assert!(harness.dispatcher.is_active(&alice_in_general()));

    release.add_permits(1);
    let finished = first
        .await
        .expect("dispatch task")
        .expect("dispatch succeeds")
        .expect("slow matched");
    assert_eq!(finished.status(), InvocationStatus::Completed);
    assert!(starts.try_recv().is_err());
    assert_eq!(
        harness.drain_channels(),
        vec![EventChannel::Started, EventChannel::Finished]
    );
    assert!(!harness.dispatcher.is_active(&alice_in_general()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn other_authors_are_not_blocked() {
    let (started, mut starts) = mpsc::unbounded_channel();
    let release = Arc::new(Semaphore::new(0));
    let harness = Harness::with_commands(vec![blocking_command(started, Arc::clone(&release))]);
    let for_alice = harness.dispatcher.clone();
    let alice = tokio::spawn(async move { for_alice.dispatch(message("m-1", "x!slow")).await });
    assert_eq!(starts.recv().await.as_deref(), Some("alice"));

    let for_bob = harness.dispatcher.clone();
    let bob = tokio::spawn(async move {
        for_bob
            .dispatch(message_from("bob", "m-2", "x!slow"))
            .await
    });
    assert_eq!(starts.recv().await.as_deref(), Some("bob"));

    release.add_permits(1);
    for handle in [alice, bob] {
        let invocation = handle
            .await
            .expect("dispatch task")
            .expect("dispatch succeeds")
            .expect("slow matched");
        assert_eq!(invocation.status(), InvocationStatus::Completed);
    }
}

#[rstest]
#[tokio::test]
async fn programmatic_cancel_stops_a_pending_prompt() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let ban = recording_command("ban", runs).with_argument(
        ArgumentDescriptor::new("member", TextResolver::new()).with_prompt("Who?"),
    );
    let mut harness = Harness::with_commands(vec![ban]);
    let dispatcher = harness.dispatcher.clone();
    let pending = tokio::spawn(async move { dispatcher.dispatch(message("m-1", "x!ban")).await });
    harness.transport.wait_for_outbox(1).await;

    assert!(harness.dispatcher.cancel(&alice_in_general(), "shutting down"));

    let invocation = pending
        .await
        .expect("dispatch task")
        .expect("dispatch succeeds")
        .expect("ban matched");
    assert_eq!(invocation.status(), InvocationStatus::Cancelled);
    assert!(seen.try_recv().is_err());
    assert_eq!(
        harness.transport.texts().last().map(String::as_str),
        Some("Command cancelled: shutting down")
    );
    let events = harness.drain_events();
    assert!(matches!(
        events.last(),
        Some(DispatchEvent::Cancelled {
            reason: CancelReason::Requested { argument, reason },
            ..
        }) if argument == "member" && reason == "shutting down"
    ));
}

#[rstest]
#[tokio::test]
async fn cancelling_an_idle_session_is_a_no_op() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let harness = Harness::with_commands(vec![recording_command("echo", runs)]);

    assert!(!harness.dispatcher.cancel(&alice_in_general(), "nothing to stop"));

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!echo"))
        .await
        .expect("dispatch succeeds")
        .expect("echo matched");
    assert_eq!(invocation.status(), InvocationStatus::Completed);
    assert_eq!(seen.try_recv().expect("command ran"), json!({}));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_during_validation_stops_the_command() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let (entered, mut entries) = mpsc::unbounded_channel();
    let release = Arc::new(Semaphore::new(0));
    let holding = HoldingMiddleware {
        entered,
        release: Arc::clone(&release),
    };
    let mut harness = Harness::customised(vec![recording_command("echo", runs)], |builder| {
        builder
            .with_config(default_config())
            .with_global_middleware(holding)
    });
    let dispatcher = harness.dispatcher.clone();
    let pending = tokio::spawn(async move { dispatcher.dispatch(message("m-1", "x!echo")).await });
    entries.recv().await.expect("middleware entered");

    assert!(harness.dispatcher.cancel(&alice_in_general(), "stop"));
    release.add_permits(1);

    let invocation = pending
        .await
        .expect("dispatch task")
        .expect("dispatch succeeds")
        .expect("echo matched");
    assert_eq!(invocation.status(), InvocationStatus::Cancelled);
    assert!(seen.try_recv().is_err());
    assert_eq!(harness.transport.texts(), vec!["Command cancelled: stop"]);
    assert!(matches!(
        harness.drain_events().last(),
        Some(DispatchEvent::Cancelled {
            reason: CancelReason::Requested { argument, reason },
            ..
        }) if argument.is_empty() && reason == "stop"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_that_missed_its_invocation_does_not_leak_into_the_next() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let (started, mut starts) = mpsc::unbounded_channel();
    let release = Arc::new(Semaphore::new(0));
    let harness = Harness::with_commands(vec![
        blocking_command(started, Arc::clone(&release)),
        recording_command("echo", runs),
    ]);
    let dispatcher = harness.dispatcher.clone();
    let slow = tokio::spawn(async move { dispatcher.dispatch(message("m-1", "x!slow")).await });
    assert_eq!(starts.recv().await.as_deref(), Some("alice"));

    assert!(harness.dispatcher.cancel(&alice_in_general(), "too late"));
    release.add_permits(1);
    let finished = slow
        .await
        .expect("dispatch task")
        .expect("dispatch succeeds")
        .expect("slow matched");
    assert_eq!(finished.status(), InvocationStatus::Completed);

    let next = harness
        .dispatcher
        .dispatch(message("m-2", "x!echo"))
        .await
        .expect("dispatch succeeds")
        .expect("echo matched");
    assert_eq!(next.status(), InvocationStatus::Completed);
    assert_eq!(seen.try_recv().expect("echo ran"), json!({}));
}
