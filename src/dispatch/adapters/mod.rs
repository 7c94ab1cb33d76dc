//! Adapter implementations of the dispatch ports.
//!
//! - [`memory`]: in-process transport and loader for embedding and tests
//! - [`broadcast`]: tokio broadcast event bus
//! - [`resolvers`]: built-in argument resolvers
//! - [`closure`]: closure-shaped commands, middleware, and resolvers

pub mod broadcast;
pub mod closure;
pub mod memory;
pub mod resolvers;

pub use broadcast::BroadcastEventBus;
pub use closure::{FnCommand, FnMiddleware, FnResolver};
pub use memory::{InMemoryTransport, OutboxEntry, StaticCommandLoader};
pub use resolvers::{BooleanResolver, ChoiceResolver, IntegerResolver, TextResolver};
