//! Middleware port.

use async_trait::async_trait;

use crate::dispatch::domain::{CommandFault, Invocation, ValidationResult};

/// A validation step run before argument collection.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name reported in `invalid` events and logs.
    fn name(&self) -> &str;

    /// Inspects (and may annotate) the invocation.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFault`] for programmer errors. User-facing
    /// rejections are `Ok(ValidationResult::invalid(..))`.
    async fn run(&self, invocation: &mut Invocation) -> Result<ValidationResult, CommandFault>;
}
