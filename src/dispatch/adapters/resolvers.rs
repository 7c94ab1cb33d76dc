//! Built-in argument resolvers.
//!
//! Every built-in treats an empty candidate as unresolved, so the collector
//! prompts for it (or skips it when optional), and rejects malformed text
//! with a reason the author sees in the re-prompt.

use async_trait::async_trait;
use serde_json::{Number, Value};

use crate::dispatch::ports::{ArgumentResolver, ResolveContext, ResolveError, ResolveResult};

/// Accepts any non-empty text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResolver;

impl TextResolver {
    /// Creates the resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArgumentResolver for TextResolver {
    async fn resolve(&self, candidate: &str, _ctx: &ResolveContext<'_>) -> ResolveResult {
        let text = candidate.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::String(text.to_owned())))
    }
}

/// Parses signed or unsigned integers, optionally bounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerResolver {
    min: Option<i64>,
    max: Option<i64>,
}

impl IntegerResolver {
    /// Creates an unbounded resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Rejects values below `min`.
    #[must_use]
    pub const fn with_min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Rejects values above `max`.
    #[must_use]
    pub const fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    fn check_bounds(&self, value: i64) -> Result<(), ResolveError> {
        if let Some(min) = self.min.filter(|min| value < *min) {
            return Err(ResolveError::rejected(format!(
                "Expected a number of at least {min}."
            )));
        }
        if let Some(max) = self.max.filter(|max| value > *max) {
            return Err(ResolveError::rejected(format!(
                "Expected a number of at most {max}."
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ArgumentResolver for IntegerResolver {
    async fn resolve(&self, candidate: &str, _ctx: &ResolveContext<'_>) -> ResolveResult {
        let raw = candidate.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(signed) = raw.parse::<i64>() {
            self.check_bounds(signed)?;
            return Ok(Some(Value::Number(Number::from(signed))));
        }
        if let Ok(unsigned) = raw.parse::<u64>() {
            if self.max.is_some() {
                return Err(ResolveError::rejected("That number is too large."));
            }
            return Ok(Some(Value::Number(Number::from(unsigned))));
        }
        Err(ResolveError::rejected(format!("'{raw}' is not a whole number.")))
    }
}

/// Parses yes/no style answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanResolver;

impl BooleanResolver {
    /// Creates the resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArgumentResolver for BooleanResolver {
    async fn resolve(&self, candidate: &str, _ctx: &ResolveContext<'_>) -> ResolveResult {
        let raw = candidate.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(Some(Value::Bool(true))),
            "false" | "no" | "n" | "off" | "0" => Ok(Some(Value::Bool(false))),
            _ => Err(ResolveError::rejected("Expected yes or no.")),
        }
    }
}

/// Accepts one of a fixed set of options, case-insensitively.
///
/// The resolved value is the option as declared, not as typed.
#[derive(Debug, Clone, Default)]
pub struct ChoiceResolver {
    options: Vec<String>,
}

impl ChoiceResolver {
    /// Creates a resolver over `options`.
    #[must_use]
    pub fn new<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the declared options.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

#[async_trait]
impl ArgumentResolver for ChoiceResolver {
    async fn resolve(&self, candidate: &str, _ctx: &ResolveContext<'_>) -> ResolveResult {
        let raw = candidate.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        self.options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(raw))
            .map(|option| Some(Value::String(option.clone())))
            .ok_or_else(|| {
                ResolveError::rejected(format!("Expected one of [{}].", self.options.join(", ")))
            })
    }
}
