//! Command resolver: turns an inbound message into at most one match.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::TriggerRegistry;
use crate::dispatch::domain::{InboundMessage, TriggerMatch, is_case_sensitive, strip_literal};
use crate::dispatch::ports::{CommandLookup, CustomResolution, CustomResolver};

/// A global prefix marking a message as addressed to the bot.
#[derive(Debug, Clone)]
pub enum Prefix {
    /// Literal prefix, case rule applied.
    Literal {
        /// Prefix text.
        text: String,
        /// Whether comparison is case-sensitive.
        case_sensitive: bool,
    },
    /// Pattern that must match at the start of the text.
    Pattern(Regex),
}

impl Prefix {
    /// Creates a literal prefix.
    #[must_use]
    pub fn literal(source: impl Into<String>) -> Self {
        let text = source.into();
        let case_sensitive = is_case_sensitive(&text);
        Self::Literal {
            text,
            case_sensitive,
        }
    }

    /// Returns the text after the prefix when `content` starts with it.
    #[must_use]
    pub fn strip<'a>(&self, content: &'a str) -> Option<&'a str> {
        match self {
            Self::Literal {
                text,
                case_sensitive,
            } => {
                if text.is_empty() {
                    return None;
                }
                strip_literal(content, text, *case_sensitive)
            }
            Self::Pattern(regex) => regex
                .find(content)
                .filter(|found| found.start() == 0 && !found.is_empty())
                .and_then(|found| content.get(found.end()..)),
        }
    }
}

/// Resolution pipeline: override body, custom resolvers, global prefixes,
/// then trigger lookup.
#[derive(Clone, Default)]
pub struct CommandResolver {
    prefixes: Vec<Prefix>,
    custom: Vec<Arc<dyn CustomResolver>>,
}

impl fmt::Debug for CommandResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandResolver")
            .field("prefixes", &self.prefixes)
            .field("custom", &self.custom.len())
            .finish()
    }
}

impl CommandResolver {
    /// Creates a resolver over the given prefixes.
    #[must_use]
    pub fn new(prefixes: Vec<Prefix>) -> Self {
        Self {
            prefixes,
            custom: Vec::new(),
        }
    }

    /// Appends a custom resolver; resolvers run in insertion order.
    #[must_use]
    pub fn with_custom(mut self, resolver: Arc<dyn CustomResolver>) -> Self {
        self.custom.push(resolver);
        self
    }

    /// Returns the configured prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }

    /// Resolves `message` against `registry`, stopping at the first success.
    ///
    /// Pure: never errors and never performs I/O.
    #[must_use]
    pub fn resolve(
        &self,
        message: &InboundMessage,
        registry: &TriggerRegistry,
        override_body: Option<&str>,
    ) -> Option<TriggerMatch> {
        let body = match override_body {
            Some(body) => Some(body.to_owned()),
            None => match self.run_custom(message, registry) {
                CustomResolution::Match(matched) => return Some(matched),
                CustomResolution::Body(body) => Some(body),
                CustomResolution::Pass => self.strip_prefix(message),
            },
        }?;
        registry.lookup(message, &body)
    }

    fn run_custom(&self, message: &InboundMessage, registry: &TriggerRegistry) -> CustomResolution {
        let commands: &dyn CommandLookup = registry;
        self.custom
            .iter()
            .map(|resolver| resolver.resolve(message, commands))
            .find(|resolution| !matches!(resolution, CustomResolution::Pass))
            .unwrap_or(CustomResolution::Pass)
    }

    fn strip_prefix(&self, message: &InboundMessage) -> Option<String> {
        let content = message.content().trim_start();
        self.prefixes
            .iter()
            .find_map(|prefix| prefix.strip(content))
            .or_else(|| message.is_direct().then_some(content))
            .map(|body| body.trim().to_owned())
    }
}
