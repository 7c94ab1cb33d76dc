//! Loader serving a fixed command set.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::dispatch::{
    domain::{CommandDescriptor, LoadFailure, LoadReport},
    ports::CommandLoader,
};

/// Loader returning whatever command set it currently holds.
///
/// Replacing the set between loads stands in for on-disk hot reloading.
#[derive(Debug, Clone, Default)]
pub struct StaticCommandLoader {
    report: Arc<RwLock<LoadReport>>,
}

impl StaticCommandLoader {
    /// Creates a loader serving `commands`.
    #[must_use]
    pub fn new(commands: impl IntoIterator<Item = CommandDescriptor>) -> Self {
        let report = LoadReport {
            commands: commands.into_iter().collect(),
            failures: Vec::new(),
        };
        Self {
            report: Arc::new(RwLock::new(report)),
        }
    }

    /// Adds a failure reported on every load.
    #[must_use]
    pub fn with_failure(self, failure: LoadFailure) -> Self {
        self.report
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .failures
            .push(failure);
        self
    }

    /// Replaces the command set served by later loads.
    pub fn replace(&self, commands: impl IntoIterator<Item = CommandDescriptor>) {
        let mut report = self
            .report
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        report.commands = commands.into_iter().collect();
    }
}

#[async_trait]
impl CommandLoader for StaticCommandLoader {
    async fn load(&self) -> LoadReport {
        self.report
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}
