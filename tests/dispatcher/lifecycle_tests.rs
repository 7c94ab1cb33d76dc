//! Invocation lifecycle through the dispatcher: matching, validation,
//! faults, and event ordering.

use parley::dispatch::{
    DispatchError, DispatcherConfig,
    adapters::{FnCommand, FnMiddleware, TextResolver},
    domain::{
        ArgumentDescriptor, CommandDescriptor, CommandFault, DispatchEvent, EventChannel,
        FailureStage, Invocation, InvocationStatus, ValidationResult,
    },
    ports::Middleware,
};
use rstest::rstest;
use serde_json::json;
use tokio::sync::mpsc;

use super::harness::{
    Harness, default_config, message, message_from, ping_command, recording_command,
};

fn failing_command() -> CommandDescriptor {
    CommandDescriptor::new(
        "explode",
        FnCommand::new(|_ctx| async { Err(CommandFault::new("boom")) }),
    )
    .with_trigger("explode")
}

fn moderators_only(invocation: &Invocation) -> Result<ValidationResult, CommandFault> {
    if invocation.message().author().as_str() == "mod" {
        Ok(ValidationResult::valid())
    } else {
        Ok(ValidationResult::invalid("Moderators only."))
    }
}

fn harness_with_middleware(
    config: DispatcherConfig,
    middleware: impl Middleware + 'static,
) -> Harness {
    Harness::customised(vec![ping_command()], |builder| {
        builder
            .with_config(config)
            .with_global_middleware(middleware)
    })
}

#[rstest]
#[case("hello there")]
#[case("x!nope")]
#[tokio::test]
async fn unmatched_message_only_publishes_unknown(#[case] content: &str) {
    let mut harness = Harness::with_commands(vec![ping_command()]);

    let outcome = harness
        .dispatcher
        .dispatch(message("m-1", content))
        .await
        .expect("dispatch succeeds");

    assert!(outcome.is_none());
    assert!(harness.transport.outbox().is_empty());
    let events = harness.drain_events();
    assert!(matches!(
        events.as_slice(),
        [DispatchEvent::Unknown { content: seen, .. }] if seen == content
    ));
}

#[rstest]
#[tokio::test]
async fn command_without_arguments_skips_collection() {
    let mut harness = Harness::with_commands(vec![ping_command()]);

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds")
        .expect("ping matched");

    assert_eq!(invocation.status(), InvocationStatus::Completed);
    assert_eq!(harness.transport.texts(), vec!["pong"]);
    let events = harness.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events.first(), Some(DispatchEvent::Started { invocation })
        if invocation.command == "ping" && invocation.status == InvocationStatus::Created));
    assert!(matches!(
        events.get(1),
        Some(DispatchEvent::Finished { invocation, result })
            if invocation.status == InvocationStatus::Completed && *result == json!("pong")
    ));
}

#[rstest]
#[tokio::test]
async fn rejected_invocation_replies_with_the_reason() {
    let mut harness = harness_with_middleware(
        default_config(),
        FnMiddleware::new("moderators", moderators_only),
    );

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds")
        .expect("ping matched");

    assert_eq!(invocation.status(), InvocationStatus::Failed);
    assert_eq!(harness.transport.texts(), vec!["Moderators only."]);
    let events = harness.drain_events();
    assert!(matches!(
        events.last(),
        Some(DispatchEvent::Invalid { middleware, reason: Some(reason), .. })
            if middleware == "moderators" && reason == "Moderators only."
    ));

    let allowed = harness
        .dispatcher
        .dispatch(message_from("mod", "m-2", "x!ping"))
        .await
        .expect("dispatch succeeds")
        .expect("ping matched");
    assert_eq!(allowed.status(), InvocationStatus::Completed);
}

#[rstest]
#[tokio::test]
async fn reply_on_invalid_can_be_turned_off() {
    let mut harness = harness_with_middleware(
        default_config().with_reply_on_invalid(false),
        FnMiddleware::new("moderators", moderators_only),
    );

    harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds");

    assert!(harness.transport.outbox().is_empty());
    assert_eq!(
        harness.drain_channels(),
        vec![EventChannel::Started, EventChannel::Invalid]
    );
}

#[rstest]
#[tokio::test]
async fn suppressed_rejection_stays_quiet() {
    fn suppress(_invocation: &Invocation) -> Result<ValidationResult, CommandFault> {
        Ok(ValidationResult::suppressed())
    }
    let mut harness = harness_with_middleware(
        default_config(),
        FnMiddleware::new("cooldown", suppress),
    );

    harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds");

    assert!(harness.transport.outbox().is_empty());
    let events = harness.drain_events();
    assert!(matches!(
        events.last(),
        Some(DispatchEvent::Invalid { reason: None, .. })
    ));
}

#[rstest]
#[tokio::test]
async fn middleware_fault_is_reported_at_the_middleware_stage() {
    fn broken(_invocation: &Invocation) -> Result<ValidationResult, CommandFault> {
        Err(CommandFault::new("permissions backend offline"))
    }
    let mut harness = harness_with_middleware(
        default_config(),
        FnMiddleware::new("permissions", broken),
    );

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("silent mode swallows faults")
        .expect("ping matched");

    assert_eq!(invocation.status(), InvocationStatus::Failed);
    let events = harness.drain_events();
    assert!(matches!(
        events.last(),
        Some(DispatchEvent::Failed { stage: FailureStage::Middleware, error, .. })
            if error.contains("permissions")
    ));
}

#[rstest]
#[tokio::test]
async fn silent_mode_reports_faults_only_as_events() {
    let mut harness = Harness::with_commands(vec![failing_command()]);

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!explode"))
        .await
        .expect("silent mode swallows faults")
        .expect("explode matched");

    assert_eq!(invocation.status(), InvocationStatus::Failed);
    assert!(harness.transport.outbox().is_empty());
    let events = harness.drain_events();
    assert!(matches!(
        events.last(),
        Some(DispatchEvent::Failed { stage: FailureStage::Execution, error, .. }) if error == "boom"
    ));
}

#[rstest]
#[tokio::test]
async fn loud_mode_returns_faults_to_the_caller() {
    let mut harness = Harness::new(default_config().with_silent(false), vec![failing_command()]);

    let error = harness
        .dispatcher
        .dispatch(message("m-1", "x!explode"))
        .await
        .expect_err("fault surfaces");

    assert!(matches!(
        &error,
        DispatchError::Command { command, stage: FailureStage::Execution, fault, .. }
            if command == "explode" && fault.message() == "boom"
    ));
    assert_eq!(
        harness.drain_channels(),
        vec![EventChannel::Started, EventChannel::Failed]
    );
    let session = message("m-1", "x!explode").session_key();
    assert!(!harness.dispatcher.is_active(&session));
}

#[rstest]
#[case(true, 0)]
#[case(false, 1)]
#[tokio::test]
async fn automated_authors_follow_configuration(#[case] ignore: bool, #[case] replies: usize) {
    let mut harness = Harness::new(
        default_config().with_ignore_automated(ignore),
        vec![ping_command()],
    );

    harness
        .dispatcher
        .dispatch(message("m-1", "x!ping").automated())
        .await
        .expect("dispatch succeeds");

    assert_eq!(harness.transport.outbox().len(), replies);
    assert_eq!(harness.drain_events().is_empty(), ignore);
}

#[rstest]
#[tokio::test]
async fn explicit_body_bypasses_prefixes() {
    let harness = Harness::with_commands(vec![ping_command()]);

    let invocation = harness
        .dispatcher
        .dispatch_with_body(message("m-1", "/ping from a slash menu"), "ping")
        .await
        .expect("dispatch succeeds")
        .expect("ping matched");

    assert_eq!(invocation.trigger(), "ping");
    assert_eq!(harness.transport.texts(), vec!["pong"]);
}

#[rstest]
#[tokio::test]
async fn explicit_body_dispatch_answers_a_pending_prompt() {
    let (runs, mut seen) = mpsc::unbounded_channel();
    let ban = recording_command("ban", runs).with_argument(
        ArgumentDescriptor::new("member", TextResolver::new()).with_prompt("Who?"),
    );
    let harness = Harness::with_commands(vec![ban]);
    let dispatcher = harness.dispatcher.clone();
    let pending = tokio::spawn(async move {
        dispatcher
            .dispatch_with_body(message("m-1", "/ban"), "ban")
            .await
    });
    harness.transport.wait_for_outbox(1).await;

    let answer = harness
        .dispatcher
        .dispatch_with_body(message("m-2", "dave"), "dave")
        .await
        .expect("reply routed");
    assert!(answer.is_none());

    let invocation = pending
        .await
        .expect("dispatch task")
        .expect("dispatch succeeds")
        .expect("ban matched");
    assert_eq!(invocation.status(), InvocationStatus::Completed);
    assert_eq!(seen.try_recv().expect("ban ran"), json!({"member": "dave"}));
}
