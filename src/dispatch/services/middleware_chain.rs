//! Sequential middleware execution.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::domain::{CommandFault, Invocation, ValidationResult};
use crate::dispatch::ports::Middleware;

/// Why the chain stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiddlewareFailure {
    /// A step rejected the invocation.
    Rejected {
        /// Name of the rejecting step.
        middleware: String,
        /// The rejection.
        result: ValidationResult,
    },
    /// A step raised a programmer fault.
    Fault {
        /// Name of the faulting step.
        middleware: String,
        /// The fault.
        fault: CommandFault,
    },
}

/// Global middleware, run before any command-specific middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    global: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.global.iter().map(|step| step.name()).collect();
        f.debug_struct("MiddlewareChain")
            .field("global", &names)
            .finish()
    }
}

impl MiddlewareChain {
    /// Creates a chain over `global`.
    #[must_use]
    pub const fn new(global: Vec<Arc<dyn Middleware>>) -> Self {
        Self { global }
    }

    /// Returns the number of global steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len()
    }

    /// Returns whether there are no global steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }

    /// Runs the global steps then `command_middleware`, each to completion,
    /// stopping at the first rejection or fault.
    ///
    /// # Errors
    ///
    /// Returns [`MiddlewareFailure`] naming the step that stopped the chain.
    pub async fn run(
        &self,
        invocation: &mut Invocation,
        command_middleware: &[Arc<dyn Middleware>],
    ) -> Result<(), MiddlewareFailure> {
        for step in self.global.iter().chain(command_middleware) {
            let middleware = step.name().to_owned();
            match step.run(invocation).await {
                Ok(result) if result.is_valid() => {
                    tracing::debug!(middleware = %middleware, "middleware passed");
                }
                Ok(result) => return Err(MiddlewareFailure::Rejected { middleware, result }),
                Err(fault) => return Err(MiddlewareFailure::Fault { middleware, fault }),
            }
        }
        Ok(())
    }
}
