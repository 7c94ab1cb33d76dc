//! Step definitions for argument prompting scenarios.

mod given;
mod then;
mod when;
pub mod world;
