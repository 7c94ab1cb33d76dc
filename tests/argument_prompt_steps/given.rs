//! Given steps for argument prompting scenarios.

use super::world::PromptWorld;
use eyre::WrapErr;
use parley::dispatch::{
    DispatcherConfig,
    adapters::{IntegerResolver, TextResolver},
    domain::ArgumentDescriptor,
};
use rstest_bdd_macros::given;

#[given(r#"a dispatcher listening on the prefix "{prefix}""#)]
fn dispatcher_with_prefix(world: &mut PromptWorld, prefix: String) -> Result<(), eyre::Report> {
    world.reconfigure(DispatcherConfig::default().with_prefix(prefix))
}

#[given(r#"a "{command}" command asking "{prompt}" for its "{argument}" text argument"#)]
fn command_with_prompted_text(
    world: &mut PromptWorld,
    command: String,
    prompt: String,
    argument: String,
) -> Result<(), eyre::Report> {
    let descriptor = world
        .recording_command(&command)
        .with_argument(ArgumentDescriptor::new(argument, TextResolver::new()).with_prompt(prompt));
    world
        .dispatcher
        .register(descriptor)
        .wrap_err("register prompted command")
}

#[given(r#"an "{command}" command taking whole numbers "{first}" and "{second}""#)]
fn command_with_two_integers(
    world: &mut PromptWorld,
    command: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let descriptor = [first, second]
        .into_iter()
        .fold(world.recording_command(&command), |descriptor, name| {
            let prompt = format!("Value for {name}?");
            descriptor.with_argument(
                ArgumentDescriptor::new(name, IntegerResolver::new()).with_prompt(prompt),
            )
        });
    world
        .dispatcher
        .register(descriptor)
        .wrap_err("register integer command")
}
