//! Argument declarations and the resolved-arguments mapping.

mod matcher;

pub use matcher::{ArgumentMatcher, MatchedCandidate};

use regex::{Regex, RegexBuilder};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::ports::resolver::ArgumentResolver;

/// Keyword and pattern that abort argument collection when replied.
#[derive(Debug, Clone)]
pub struct CancelPattern {
    keyword: String,
    pattern: Regex,
}

impl CancelPattern {
    /// Builds a pattern matching exactly `keyword`, case-insensitively,
    /// ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the escaped keyword cannot compile
    /// (only possible for pathological sizes).
    pub fn keyword(text: impl Into<String>) -> Result<Self, regex::Error> {
        let keyword = text.into().trim().to_owned();
        let pattern = RegexBuilder::new(&format!(r"^\s*{}\s*$", regex::escape(&keyword)))
            .case_insensitive(true)
            .build()?;
        Ok(Self { keyword, pattern })
    }

    /// Uses a custom pattern; `keyword` is what prompts advertise.
    #[must_use]
    pub fn new(keyword: impl Into<String>, pattern: Regex) -> Self {
        Self {
            keyword: keyword.into(),
            pattern,
        }
    }

    /// Returns the advertised keyword.
    #[must_use]
    pub fn keyword_text(&self) -> &str {
        &self.keyword
    }

    /// Returns whether `reply` requests cancellation.
    #[must_use]
    pub fn is_match(&self, reply: &str) -> bool {
        self.pattern.is_match(reply)
    }
}

/// Static declaration of one command argument.
///
/// Descriptors are stateless: all per-invocation progress lives in the
/// collection engine, so one descriptor serves every invocation.
///
/// # Examples
///
/// ```
/// use parley::dispatch::adapters::resolvers::IntegerResolver;
/// use parley::dispatch::domain::ArgumentDescriptor;
///
/// let amount = ArgumentDescriptor::new("amount", IntegerResolver::new())
///     .with_prompt("How many?")
///     .with_reprompt("That is not a number. How many?");
/// assert_eq!(amount.key(), "amount");
/// assert!(!amount.is_optional());
/// ```
#[derive(Clone)]
pub struct ArgumentDescriptor {
    key: String,
    prompt: Option<String>,
    reprompt: Option<String>,
    optional: bool,
    resolver: Arc<dyn ArgumentResolver>,
    matcher: ArgumentMatcher,
    timeout: Option<Duration>,
    cancel: Option<CancelPattern>,
}

impl ArgumentDescriptor {
    /// Declares a required argument matched by the first token of the body.
    #[must_use]
    pub fn new(key: impl Into<String>, resolver: impl ArgumentResolver + 'static) -> Self {
        Self::with_shared_resolver(key, Arc::new(resolver))
    }

    /// Declares an argument with a shared resolver.
    #[must_use]
    pub fn with_shared_resolver(
        key: impl Into<String>,
        resolver: Arc<dyn ArgumentResolver>,
    ) -> Self {
        Self {
            key: key.into(),
            prompt: None,
            reprompt: None,
            optional: false,
            resolver,
            matcher: ArgumentMatcher::default(),
            timeout: None,
            cancel: None,
        }
    }

    /// Sets the first prompt (a template over already resolved arguments).
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Sets the text used for prompts after a failed attempt.
    #[must_use]
    pub fn with_reprompt(mut self, reprompt: impl Into<String>) -> Self {
        self.reprompt = Some(reprompt.into());
        self
    }

    /// Marks the argument optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Sets the body matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: ArgumentMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Overrides the dispatcher's default reply timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the dispatcher's default cancel pattern.
    #[must_use]
    pub fn with_cancel_pattern(mut self, cancel: CancelPattern) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns the argument key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the prompt template, if any.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Returns the re-prompt template, if any.
    #[must_use]
    pub fn reprompt(&self) -> Option<&str> {
        self.reprompt.as_deref()
    }

    /// Returns whether the argument may be skipped.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the resolver.
    #[must_use]
    pub fn resolver(&self) -> &dyn ArgumentResolver {
        self.resolver.as_ref()
    }

    /// Returns the body matcher.
    #[must_use]
    pub const fn matcher(&self) -> &ArgumentMatcher {
        &self.matcher
    }

    /// Returns the timeout override.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the cancel pattern override.
    #[must_use]
    pub const fn cancel_pattern(&self) -> Option<&CancelPattern> {
        self.cancel.as_ref()
    }
}

impl fmt::Debug for ArgumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentDescriptor")
            .field("key", &self.key)
            .field("prompt", &self.prompt)
            .field("reprompt", &self.reprompt)
            .field("optional", &self.optional)
            .field("matcher", &self.matcher)
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Resolved argument values in declaration order.
///
/// Skipped optional arguments are absent rather than stored as null.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedArguments {
    entries: Vec<(String, Value)>,
}

impl ResolvedArguments {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Stores a value, replacing an earlier value for the same key in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let key = name.into();
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == key)
        {
            slot.1 = value;
            return;
        }
        self.entries.push((key, value));
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Returns whether `key` was resolved.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of resolved arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the keys in declaration order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Converts the mapping into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Serialize for ResolvedArguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
