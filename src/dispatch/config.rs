//! Dispatcher configuration.

use minijinja::Environment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::domain::CancelPattern;
use super::services::{
    CancellationMessages, OverlapPolicy, Prefix, PromptRenderer, prompt::DEFAULT_CANCEL_SUFFIX,
};

/// Errors raised while loading or compiling a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document is malformed.
    #[error("invalid dispatcher configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A prefix pattern does not compile.
    #[error("invalid prefix pattern '{pattern}': {reason}")]
    InvalidPrefix {
        /// Offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// The cancel keyword is blank or does not compile.
    #[error("invalid cancel keyword '{keyword}': {reason}")]
    InvalidCancelKeyword {
        /// Offending keyword.
        keyword: String,
        /// What is wrong.
        reason: String,
    },

    /// A message template has a syntax error.
    #[error("invalid {name} template: {reason}")]
    InvalidTemplate {
        /// Template name.
        name: &'static str,
        /// Parser message.
        reason: String,
    },
}

/// Dispatcher settings.
///
/// Missing JSON fields take their defaults, so `{}` is a valid document.
///
/// # Examples
///
/// ```
/// use parley::dispatch::DispatcherConfig;
///
/// let config = DispatcherConfig::from_json_str(r#"{"prefixes": ["x!"], "silent": false}"#)
///     .expect("valid configuration");
/// assert_eq!(config.prefixes, vec!["x!".to_owned()]);
/// assert!(!config.silent);
/// assert_eq!(config.argument_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Literal global prefixes, case rule applied.
    pub prefixes: Vec<String>,
    /// Global prefix patterns anchored at the start of the message.
    pub prefix_patterns: Vec<String>,
    /// Whether later replies edit the previous one.
    pub edit_responses: bool,
    /// Whether programmer faults stay out of `dispatch` results.
    pub silent: bool,
    /// Whether messages from automated accounts are ignored.
    pub ignore_automated: bool,
    /// Whether a literal trigger may be claimed by a second command.
    pub allow_trigger_overlap: bool,
    /// Whether middleware rejections are answered.
    pub reply_on_invalid: bool,
    /// Reply timeout for prompted arguments, in seconds.
    pub argument_timeout_secs: u64,
    /// Reply that cancels argument collection.
    pub cancel_keyword: String,
    /// Template appended to every prompt.
    pub cancel_suffix: String,
    /// Replies sent when argument collection is cancelled.
    pub cancellation_messages: CancellationMessages,
    /// Lifecycle events buffered per subscriber.
    pub event_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            prefixes: Vec::new(),
            prefix_patterns: Vec::new(),
            edit_responses: false,
            silent: true,
            ignore_automated: true,
            allow_trigger_overlap: true,
            reply_on_invalid: true,
            argument_timeout_secs: 30,
            cancel_keyword: "cancel".to_owned(),
            cancel_suffix: DEFAULT_CANCEL_SUFFIX.to_owned(),
            cancellation_messages: CancellationMessages::default(),
            event_capacity: 256,
        }
    }
}

impl DispatcherConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds a literal prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Adds a prefix pattern.
    #[must_use]
    pub fn with_prefix_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.prefix_patterns.push(pattern.into());
        self
    }

    /// Sets edit mode.
    #[must_use]
    pub const fn with_edit_responses(mut self, edit: bool) -> Self {
        self.edit_responses = edit;
        self
    }

    /// Sets silent mode.
    #[must_use]
    pub const fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Sets whether automated authors are ignored.
    #[must_use]
    pub const fn with_ignore_automated(mut self, ignore: bool) -> Self {
        self.ignore_automated = ignore;
        self
    }

    /// Sets whether literal triggers may overlap.
    #[must_use]
    pub const fn with_allow_trigger_overlap(mut self, allow: bool) -> Self {
        self.allow_trigger_overlap = allow;
        self
    }

    /// Sets whether middleware rejections are answered.
    #[must_use]
    pub const fn with_reply_on_invalid(mut self, reply: bool) -> Self {
        self.reply_on_invalid = reply;
        self
    }

    /// Sets the default reply timeout in seconds.
    #[must_use]
    pub const fn with_argument_timeout_secs(mut self, secs: u64) -> Self {
        self.argument_timeout_secs = secs;
        self
    }

    /// Sets the default cancel keyword.
    #[must_use]
    pub fn with_cancel_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.cancel_keyword = keyword.into();
        self
    }

    /// Sets the prompt suffix template.
    #[must_use]
    pub fn with_cancel_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.cancel_suffix = suffix.into();
        self
    }

    /// Returns the default reply timeout.
    #[must_use]
    pub const fn argument_timeout(&self) -> Duration {
        Duration::from_secs(self.argument_timeout_secs)
    }

    /// Returns the registry overlap policy.
    #[must_use]
    pub const fn overlap_policy(&self) -> OverlapPolicy {
        if self.allow_trigger_overlap {
            OverlapPolicy::LastWins
        } else {
            OverlapPolicy::Reject
        }
    }

    /// Compiles literal prefixes followed by prefix patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPrefix`] for a pattern that does not
    /// compile.
    pub fn compile_prefixes(&self) -> Result<Vec<Prefix>, ConfigError> {
        let literals = self
            .prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| Ok(Prefix::literal(prefix.as_str())));
        let patterns = self.prefix_patterns.iter().map(|pattern| {
            Regex::new(pattern)
                .map(Prefix::Pattern)
                .map_err(|error| ConfigError::InvalidPrefix {
                    pattern: pattern.clone(),
                    reason: error.to_string(),
                })
        });
        literals.chain(patterns).collect()
    }

    /// Compiles the default cancel pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCancelKeyword`] for a blank keyword.
    pub fn cancel_pattern(&self) -> Result<CancelPattern, ConfigError> {
        if self.cancel_keyword.trim().is_empty() {
            return Err(ConfigError::InvalidCancelKeyword {
                keyword: self.cancel_keyword.clone(),
                reason: "keyword cannot be blank".to_owned(),
            });
        }
        CancelPattern::keyword(self.cancel_keyword.as_str()).map_err(|error| {
            ConfigError::InvalidCancelKeyword {
                keyword: self.cancel_keyword.clone(),
                reason: error.to_string(),
            }
        })
    }

    /// Builds the prompt renderer after checking every template parses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] for a malformed template.
    pub fn prompt_renderer(&self) -> Result<PromptRenderer, ConfigError> {
        let messages = &self.cancellation_messages;
        let templates = [
            ("cancel suffix", self.cancel_suffix.as_str()),
            ("user cancelled", messages.user_cancelled.as_str()),
            ("timed out", messages.timed_out.as_str()),
            ("missing argument", messages.missing_argument.as_str()),
            ("requested cancellation", messages.requested.as_str()),
        ];
        let environment = Environment::new();
        for (name, source) in templates {
            environment
                .template_from_str(source)
                .map_err(|error| ConfigError::InvalidTemplate {
                    name,
                    reason: error.to_string(),
                })?;
        }
        Ok(PromptRenderer::new(
            self.cancel_suffix.clone(),
            self.cancellation_messages.clone(),
        ))
    }
}
