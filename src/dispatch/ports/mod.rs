//! Port contracts for command dispatch.
//!
//! Commands, middleware, and resolvers are the extension surface embedding
//! code implements; the responder and command lookup are what the
//! dispatcher hands back to them. The transport, loader, and event sink are
//! the infrastructure seams the dispatcher talks through.

pub mod command;
pub mod events;
pub mod loader;
pub mod middleware;
pub mod resolver;
pub mod responder;
pub mod transport;

pub use command::{Command, CommandResult, ExecutionContext};
pub use events::EventSink;
pub use loader::CommandLoader;
pub use middleware::Middleware;
pub use resolver::{
    ArgumentResolver, CommandLookup, CustomResolution, CustomResolver, ResolveContext,
    ResolveError, ResolveResult,
};
pub use responder::{Responder, ResponseError, ResponseResult, SendOptions};
pub use transport::{MessageTransport, TransportError, TransportResult};
