//! When steps for argument prompting scenarios.

use super::world::{PromptWorld, run_async, run_bounded};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"the author sends "{content}""#)]
fn author_sends(world: &mut PromptWorld, content: String) -> Result<(), eyre::Report> {
    let message = world.message(&content);
    let outcome = run_async(world.dispatcher.dispatch(message)).wrap_err("dispatch message")?;
    world.outcome = Some(outcome);
    Ok(())
}

#[when(r#"the author starts "{content}""#)]
fn author_starts(world: &mut PromptWorld, content: String) -> Result<(), eyre::Report> {
    let message = world.message(&content);
    let delivered = world.transport.outbox().len();
    let dispatcher = world.dispatcher.clone();
    world.pending = Some(tokio::spawn(async move { dispatcher.dispatch(message).await }));
    run_bounded(
        "the first prompt",
        world.transport.wait_for_outbox(delivered + 1),
    )?;
    Ok(())
}

#[when(r#"the author replies "{content}""#)]
fn author_replies(world: &mut PromptWorld, content: String) -> Result<(), eyre::Report> {
    let message = world.message(&content);
    let routed = run_async(world.dispatcher.dispatch(message)).wrap_err("dispatch reply")?;
    if routed.is_some() {
        return Err(eyre::eyre!("reply started a new invocation instead of answering"));
    }
    Ok(())
}
