//! Closure adapters for the extension traits.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::dispatch::domain::{CommandFault, Invocation, ValidationResult};
use crate::dispatch::ports::{
    ArgumentResolver, Command, CommandResult, ExecutionContext, Middleware, ResolveContext,
    ResolveResult,
};

/// A command whose body is an async closure.
///
/// # Examples
///
/// ```
/// use parley::dispatch::adapters::FnCommand;
/// use serde_json::json;
///
/// let ping = FnCommand::new(|_ctx| async { Ok(json!("pong")) });
/// # let _ = ping;
/// ```
pub struct FnCommand<F> {
    body: F,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl<F, Fut> FnCommand<F>
where
    F: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    /// Wraps `body`.
    #[must_use]
    pub fn new(body: F) -> Self {
        Self {
            body,
            middleware: Vec::new(),
        }
    }

    /// Attaches command-specific middleware.
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }
}

impl<F> fmt::Debug for FnCommand<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCommand")
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> Command for FnCommand<F>
where
    F: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    async fn execute(&self, ctx: ExecutionContext) -> CommandResult {
        (self.body)(ctx).await
    }

    fn middleware(&self) -> Vec<Arc<dyn Middleware>> {
        self.middleware.clone()
    }
}

/// Middleware backed by a synchronous check over the invocation.
pub struct FnMiddleware<F> {
    name: String,
    check: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&Invocation) -> Result<ValidationResult, CommandFault> + Send + Sync,
{
    /// Wraps `check` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&Invocation) -> Result<ValidationResult, CommandFault> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, invocation: &mut Invocation) -> Result<ValidationResult, CommandFault> {
        (self.check)(invocation)
    }
}

/// Resolver backed by a synchronous function.
pub struct FnResolver<F> {
    resolve: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str, &ResolveContext<'_>) -> ResolveResult + Send + Sync,
{
    /// Wraps `resolve`.
    #[must_use]
    pub const fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

impl<F> fmt::Debug for FnResolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> ArgumentResolver for FnResolver<F>
where
    F: Fn(&str, &ResolveContext<'_>) -> ResolveResult + Send + Sync,
{
    async fn resolve(&self, candidate: &str, ctx: &ResolveContext<'_>) -> ResolveResult {
        (self.resolve)(candidate, ctx)
    }
}
