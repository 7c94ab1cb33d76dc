//! Trigger registry: the lookup structure from message bodies to commands.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::domain::{
    CommandDescriptor, InboundMessage, RegistryError, Trigger, TriggerMatch,
};
use crate::dispatch::ports::CommandLookup;

/// What happens when a literal trigger is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// The later registration takes the trigger over.
    #[default]
    LastWins,
    /// The later registration fails with [`RegistryError::DuplicateTrigger`].
    Reject,
}

#[derive(Debug, Clone)]
struct Entry {
    trigger: Trigger,
    command: Arc<CommandDescriptor>,
    slot: usize,
    order: usize,
}

/// Set of command descriptors keyed by their triggers.
///
/// Lookup precedence is deterministic: literal triggers first (longest
/// literal first, ties by registration order), then pattern triggers, then
/// predicate triggers, each in registration order.
#[derive(Debug, Clone, Default)]
pub struct TriggerRegistry {
    commands: Vec<Arc<CommandDescriptor>>,
    literals: Vec<Entry>,
    patterns: Vec<Entry>,
    predicates: Vec<Entry>,
    literal_owners: HashMap<String, usize>,
    policy: OverlapPolicy,
    next_order: usize,
}

impl TriggerRegistry {
    /// Creates an empty registry with the given overlap policy.
    #[must_use]
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Builds a registry from descriptors, collecting per-command errors.
    ///
    /// A failing descriptor is skipped; the others still register.
    #[must_use]
    pub fn from_descriptors(
        policy: OverlapPolicy,
        descriptors: impl IntoIterator<Item = CommandDescriptor>,
    ) -> (Self, Vec<RegistryError>) {
        let mut registry = Self::new(policy);
        let errors = descriptors
            .into_iter()
            .filter_map(|descriptor| registry.register(descriptor).err())
            .collect();
        (registry, errors)
    }

    /// Returns the overlap policy.
    #[must_use]
    pub const fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Adds a command under all of its triggers.
    ///
    /// Registering a name that already exists replaces that command.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDefinition`] for malformed
    /// descriptors and [`RegistryError::DuplicateTrigger`] when the policy
    /// rejects overlapping literals. The registry is unchanged on error.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        descriptor.validate_schema()?;

        let existing_slot = self
            .commands
            .iter()
            .position(|command| command.name() == descriptor.name());

        if self.policy == OverlapPolicy::Reject {
            self.check_overlap(&descriptor, existing_slot)?;
        }

        let shared = Arc::new(descriptor);
        let slot = match existing_slot {
            Some(slot) => {
                self.remove_triggers_of(slot);
                if let Some(current) = self.commands.get_mut(slot) {
                    *current = Arc::clone(&shared);
                }
                slot
            }
            None => {
                self.commands.push(Arc::clone(&shared));
                self.commands.len() - 1
            }
        };
        self.index_triggers(slot, &shared);
        Ok(())
    }

    fn check_overlap(
        &self,
        descriptor: &CommandDescriptor,
        replacing: Option<usize>,
    ) -> Result<(), RegistryError> {
        for trigger in descriptor.triggers() {
            let Some(key) = trigger.literal_key() else {
                continue;
            };
            match self.literal_owners.get(&key) {
                Some(owner) if Some(*owner) != replacing => {
                    return Err(RegistryError::DuplicateTrigger {
                        trigger: trigger.to_string(),
                        command: descriptor.name().to_owned(),
                        existing: self
                            .commands
                            .get(*owner)
                            .map_or_else(String::new, |command| command.name().to_owned()),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn remove_triggers_of(&mut self, slot: usize) {
        self.literals.retain(|entry| entry.slot != slot);
        self.patterns.retain(|entry| entry.slot != slot);
        self.predicates.retain(|entry| entry.slot != slot);
        self.literal_owners.retain(|_, owner| *owner != slot);
    }

    fn index_triggers(&mut self, slot: usize, descriptor: &Arc<CommandDescriptor>) {
        for trigger in descriptor.triggers() {
            let entry = Entry {
                trigger: trigger.clone(),
                command: Arc::clone(descriptor),
                slot,
                order: self.next_order,
            };
            self.next_order += 1;
            match trigger {
                Trigger::Literal { .. } => {
                    if let Some(key) = trigger.literal_key() {
                        // Last registration of an identical literal wins.
                        if let Some(previous) = self.literal_owners.insert(key.clone(), slot) {
                            self.literals.retain(|existing| {
                                existing.slot != previous
                                    || existing.trigger.literal_key().as_ref() != Some(&key)
                            });
                        }
                    }
                    self.literals.push(entry);
                }
                Trigger::Pattern(_) => self.patterns.push(entry),
                Trigger::Predicate { .. } => self.predicates.push(entry),
            }
        }
        self.literals.sort_by(|left, right| {
            let left_len = left.trigger.as_literal().map_or(0, str::len);
            let right_len = right.trigger.as_literal().map_or(0, str::len);
            right_len
                .cmp(&left_len)
                .then(left.order.cmp(&right.order))
        });
    }

    /// Finds the command triggered by `body`.
    #[must_use]
    pub fn lookup(&self, message: &InboundMessage, body: &str) -> Option<TriggerMatch> {
        self.literals
            .iter()
            .chain(&self.patterns)
            .chain(&self.predicates)
            .find_map(|entry| {
                entry.trigger.matches(message, body).map(|hit| {
                    TriggerMatch::new(Arc::clone(&entry.command), hit.matched, hit.remainder)
                })
            })
    }

    /// Finds a command by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands
            .iter()
            .find(|command| command.name() == name)
            .cloned()
    }

    /// Iterates over the registered commands in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> + Clone {
        self.commands.iter()
    }

    /// Returns the command names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| command.name().to_owned())
            .collect()
    }

    /// Returns the number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns whether no command is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandLookup for TriggerRegistry {
    fn find_trigger(&self, message: &InboundMessage, body: &str) -> Option<TriggerMatch> {
        self.lookup(message, body)
    }

    fn find_command(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.get(name)
    }
}
