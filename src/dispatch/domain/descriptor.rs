//! Command descriptors and the results of loading them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::{ArgumentDescriptor, RegistryError, Trigger};
use crate::dispatch::ports::{command::Command, middleware::Middleware};

/// Immutable declaration of one command.
///
/// Descriptors pair the declarative parts (name, triggers, arguments) with the
/// [`Command`] capability that executes the body and may contribute
/// command-specific middleware.
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    description: String,
    triggers: Vec<Trigger>,
    arguments: Vec<ArgumentDescriptor>,
    command: Arc<dyn Command>,
}

impl CommandDescriptor {
    /// Creates a descriptor with no triggers or arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Command + 'static) -> Self {
        Self::with_shared_command(name, Arc::new(command))
    }

    /// Creates a descriptor around a shared command object.
    #[must_use]
    pub fn with_shared_command(name: impl Into<String>, command: Arc<dyn Command>) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            description: String::new(),
            triggers: Vec::new(),
            arguments: Vec::new(),
            command,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<Trigger>) -> Self {
        self.triggers.push(trigger.into());
        self
    }

    /// Adds several triggers.
    #[must_use]
    pub fn with_triggers<T: Into<Trigger>>(
        mut self,
        triggers: impl IntoIterator<Item = T>,
    ) -> Self {
        self.triggers.extend(triggers.into_iter().map(Into::into));
        self
    }

    /// Appends an argument; declaration order is resolution order.
    #[must_use]
    pub fn with_argument(mut self, argument: ArgumentDescriptor) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the triggers.
    #[must_use]
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Returns the argument descriptors in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[ArgumentDescriptor] {
        &self.arguments
    }

    /// Returns the command capability.
    #[must_use]
    pub fn command(&self) -> Arc<dyn Command> {
        Arc::clone(&self.command)
    }

    /// Returns the command-specific middleware.
    #[must_use]
    pub fn middleware(&self) -> Vec<Arc<dyn Middleware>> {
        self.command.middleware()
    }

    /// Validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDefinition`] when the name is empty,
    /// no trigger is declared, a literal trigger is blank, or two arguments
    /// share a key.
    pub fn validate_schema(&self) -> Result<(), RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidDefinition {
            command: self.name.clone(),
            reason: reason.to_owned(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("command name cannot be empty"));
        }
        if self.triggers.is_empty() {
            return Err(invalid("at least one trigger is required"));
        }
        if self
            .triggers
            .iter()
            .any(|trigger| trigger.as_literal().is_some_and(str::is_empty))
        {
            return Err(invalid("literal triggers cannot be blank"));
        }

        let mut keys = HashSet::new();
        for argument in &self.arguments {
            if argument.key().trim().is_empty() {
                return Err(invalid("argument keys cannot be empty"));
            }
            if !keys.insert(argument.key()) {
                return Err(RegistryError::InvalidDefinition {
                    command: self.name.clone(),
                    reason: format!("duplicate argument '{}'", argument.key()),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("triggers", &self.triggers)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// A message body matched to a command.
#[derive(Debug, Clone)]
pub struct TriggerMatch {
    /// Matched command.
    pub descriptor: Arc<CommandDescriptor>,
    /// Text that matched the trigger.
    pub trigger: String,
    /// Remaining body for argument collection.
    pub body: String,
}

impl TriggerMatch {
    /// Creates a match.
    #[must_use]
    pub fn new(
        descriptor: Arc<CommandDescriptor>,
        trigger: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            descriptor,
            trigger: trigger.into(),
            body: body.into().trim().to_owned(),
        }
    }
}

/// A command source that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    /// Identifier of the failing source (path, module name, command name).
    pub source: String,
    /// Why loading failed.
    pub reason: String,
}

impl LoadFailure {
    /// Creates a load failure record.
    #[must_use]
    pub fn new(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason: reason.into(),
        }
    }
}

/// Everything a loader produced in one pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Successfully built descriptors.
    pub commands: Vec<CommandDescriptor>,
    /// Sources that failed; never fatal to the rest of the load.
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Adds a descriptor.
    #[must_use]
    pub fn with_command(mut self, command: CommandDescriptor) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds a failure.
    #[must_use]
    pub fn with_failure(mut self, failure: LoadFailure) -> Self {
        self.failures.push(failure);
        self
    }
}
