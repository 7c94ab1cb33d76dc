//! Orchestration services for command dispatch.
//!
//! Leaves first: the trigger registry and command resolver are pure lookup;
//! the session guard and reply router hold the only cross-invocation state;
//! the middleware chain, collector, and response channel drive one
//! invocation; the dispatcher wires them together.

pub mod collector;
pub mod dispatcher;
pub mod middleware_chain;
pub mod prompt;
pub mod registry;
pub mod reply_router;
pub mod resolver;
pub mod response;
pub mod session_guard;

pub use collector::{ArgumentCollector, CollectionOutcome};
pub use dispatcher::{
    DispatchError, DispatchResult, Dispatcher, DispatcherBuilder, LoadSummary,
};
pub use middleware_chain::{MiddlewareChain, MiddlewareFailure};
pub use prompt::{CancellationMessages, PromptContext, PromptError, PromptRenderer};
pub use registry::{OverlapPolicy, TriggerRegistry};
pub use reply_router::{ReplyRouter, ReplyWaiter, WaitOutcome};
pub use resolver::{CommandResolver, Prefix};
pub use response::ResponseChannel;
pub use session_guard::{SessionGuard, SessionPermit};
