//! Then steps for argument prompting scenarios.

use super::world::{PromptWorld, run_bounded};
use parley::dispatch::domain::InvocationStatus;
use rstest_bdd_macros::then;
use serde_json::Value;

#[then(r#"the bot asks "{text}""#)]
fn bot_asks(world: &PromptWorld, text: String) -> Result<(), eyre::Report> {
    let transport = &world.transport;
    run_bounded("the prompt", async {
        let mut wanted = 1;
        loop {
            let outbox = transport.wait_for_outbox(wanted).await;
            if outbox.iter().any(|entry| entry.text().starts_with(&text)) {
                return;
            }
            wanted = outbox.len() + 1;
        }
    })
}

#[then(r#"the invocation ends as "{status}""#)]
fn invocation_ends_as(world: &mut PromptWorld, status: String) -> Result<(), eyre::Report> {
    if let Some(handle) = world.pending.take() {
        let joined = run_bounded("the invocation to finish", handle)?
            .map_err(|err| eyre::eyre!("dispatch task panicked: {err}"))?;
        world.outcome = Some(joined.map_err(|err| eyre::eyre!("dispatch failed: {err}"))?);
    }
    let invocation = world
        .outcome
        .as_ref()
        .and_then(Option::as_ref)
        .ok_or_else(|| eyre::eyre!("no invocation was started"))?;
    let actual: InvocationStatus = invocation.status();
    if actual.as_str() != status {
        return Err(eyre::eyre!("expected status {status}, found {}", actual.as_str()));
    }
    Ok(())
}

#[then(r#"the command ran with "{argument}" set to "{value}""#)]
fn command_ran_with(
    world: &mut PromptWorld,
    argument: String,
    value: String,
) -> Result<(), eyre::Report> {
    world.collect_runs();
    let run = world
        .recorded
        .last()
        .ok_or_else(|| eyre::eyre!("the command never ran"))?;
    let actual = match run.get(&argument) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => return Err(eyre::eyre!("argument '{argument}' missing from {run}")),
    };
    if actual != value {
        return Err(eyre::eyre!("expected {argument} = {value}, found {actual}"));
    }
    Ok(())
}

#[then("the command did not run")]
fn command_did_not_run(world: &mut PromptWorld) -> Result<(), eyre::Report> {
    world.collect_runs();
    if !world.recorded.is_empty() {
        return Err(eyre::eyre!("command ran {} time(s)", world.recorded.len()));
    }
    Ok(())
}

#[then(r#"the bot finally says "{text}""#)]
fn bot_finally_says(world: &PromptWorld, text: String) -> Result<(), eyre::Report> {
    let texts = world.transport.texts();
    match texts.last() {
        Some(last) if *last == text => Ok(()),
        other => Err(eyre::eyre!("expected last reply {text:?}, found {other:?}")),
    }
}

#[then("the bot sent nothing")]
fn bot_sent_nothing(world: &PromptWorld) -> Result<(), eyre::Report> {
    let texts = world.transport.texts();
    if !texts.is_empty() {
        return Err(eyre::eyre!("expected silence, bot sent {texts:?}"));
    }
    Ok(())
}

#[then("no invocation started")]
fn no_invocation_started(world: &PromptWorld) -> Result<(), eyre::Report> {
    match &world.outcome {
        Some(None) => Ok(()),
        other => Err(eyre::eyre!("expected no invocation, found {other:?}")),
    }
}

