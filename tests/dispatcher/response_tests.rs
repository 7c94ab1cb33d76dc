//! Reply delivery as commands see it: ordering, editing, and fallbacks.

use parley::dispatch::{
    adapters::{FnCommand, OutboxEntry},
    domain::{CommandDescriptor, CommandFault, InvocationStatus},
    ports::{ExecutionContext, ResponseError},
};
use rstest::rstest;
use serde_json::json;

use super::harness::{Harness, default_config, message, ping_command};

async fn report_progress(ctx: &ExecutionContext) -> Result<(), ResponseError> {
    ctx.response.reply("building...").await?;
    ctx.response.success("built").await?;
    Ok(())
}

/// Command posting a progress note and then its result.
fn progress_command() -> CommandDescriptor {
    CommandDescriptor::new(
        "build",
        FnCommand::new(|ctx: ExecutionContext| async move {
            report_progress(&ctx)
                .await
                .map(|()| json!("built"))
                .map_err(|error| CommandFault::from_error(&error))
        }),
    )
    .with_trigger("build")
}

#[rstest]
#[tokio::test]
async fn replies_arrive_in_order_as_new_messages() {
    let harness = Harness::with_commands(vec![progress_command()]);

    harness
        .dispatcher
        .dispatch(message("m-1", "x!build"))
        .await
        .expect("dispatch succeeds");

    let outbox = harness.transport.outbox();
    assert_eq!(harness.transport.texts(), vec!["building...", "built"]);
    assert!(
        outbox
            .iter()
            .all(|entry| matches!(entry, OutboxEntry::Sent(_)))
    );
}

#[rstest]
#[tokio::test]
async fn edit_mode_updates_the_first_reply() {
    let harness = Harness::new(
        default_config().with_edit_responses(true),
        vec![progress_command()],
    );

    harness
        .dispatcher
        .dispatch(message("m-1", "x!build"))
        .await
        .expect("dispatch succeeds");

    let outbox = harness.transport.outbox();
    let first_id = outbox.first().map(|entry| entry.message().id.clone());
    assert!(matches!(outbox.first(), Some(OutboxEntry::Sent(_))));
    assert!(matches!(
        outbox.get(1),
        Some(OutboxEntry::Edited(edited)) if Some(&edited.id) == first_id.as_ref()
    ));
}

#[rstest]
#[tokio::test]
async fn refused_channel_falls_back_to_a_direct_message() {
    let harness = Harness::with_commands(vec![ping_command()]);
    harness.transport.fail_channel("general");

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("dispatch succeeds")
        .expect("ping matched");

    assert_eq!(invocation.status(), InvocationStatus::Completed);
    assert!(matches!(
        harness.transport.outbox().as_slice(),
        [OutboxEntry::Direct { author, message }]
            if author.as_str() == "alice" && message.content.text == "pong"
    ));
}

#[rstest]
#[tokio::test]
async fn undeliverable_reply_fails_the_invocation() {
    let harness = Harness::with_commands(vec![ping_command()]);
    harness.transport.fail_channel("general");
    harness.transport.disable_direct();

    let invocation = harness
        .dispatcher
        .dispatch(message("m-1", "x!ping"))
        .await
        .expect("silent mode swallows faults")
        .expect("ping matched");

    assert_eq!(invocation.status(), InvocationStatus::Failed);
    assert!(harness.transport.outbox().is_empty());
}
