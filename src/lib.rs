//! Parley: command dispatch and interactive argument collection for chat
//! bots.
//!
//! The crate turns inbound chat messages into command invocations. It
//! resolves prefixes and triggers, runs validation middleware, prompts the
//! author for missing arguments, executes the command, and serializes its
//! replies back through a pluggable transport.
//!
//! # Architecture
//!
//! Parley follows hexagonal architecture principles:
//!
//! - **Domain**: Pure dispatch values with no infrastructure dependencies
//! - **Ports**: Trait seams for commands, middleware, resolvers, and transports
//! - **Adapters**: In-memory and closure-backed implementations of the ports
//!
//! # Modules
//!
//! - [`dispatch`]: Trigger registry, dispatcher, and argument collection

pub mod dispatch;
