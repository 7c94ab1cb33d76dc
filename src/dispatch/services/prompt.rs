//! Prompt and cancellation message rendering.

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::dispatch::domain::{CancelReason, ResolvedArguments};

/// Default suffix appended to every prompt.
pub const DEFAULT_CANCEL_SUFFIX: &str =
    "Reply `{{ keyword }}` to cancel. This prompt expires in {{ seconds }}s.";

/// Errors raised while rendering prompt templates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// A template failed to render.
    #[error("failed to render {template} template for '{argument}': {reason}")]
    Render {
        /// Which template failed.
        template: &'static str,
        /// Argument being prompted for.
        argument: String,
        /// Renderer message.
        reason: String,
    },
}

/// Templates for the reply sent when argument collection is cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationMessages {
    /// Reply after the author sent the cancel keyword.
    pub user_cancelled: String,
    /// Reply after the reply timeout elapsed.
    pub timed_out: String,
    /// Reply when a required argument cannot be prompted for.
    pub missing_argument: String,
    /// Reply after a programmatic cancellation.
    pub requested: String,
}

impl Default for CancellationMessages {
    fn default() -> Self {
        Self {
            user_cancelled: "Command cancelled.".to_owned(),
            timed_out: "No reply after {{ seconds }}s, command cancelled.".to_owned(),
            missing_argument: "Missing required argument '{{ argument }}', command cancelled."
                .to_owned(),
            requested: "Command cancelled: {{ reason }}".to_owned(),
        }
    }
}

/// Values a prompt template can refer to.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Command name.
    pub command: &'a str,
    /// Argument being prompted for.
    pub argument: &'a str,
    /// Cancel keyword in effect.
    pub keyword: &'a str,
    /// Reply timeout in effect.
    pub timeout: Duration,
    /// Arguments resolved so far.
    pub arguments: &'a ResolvedArguments,
}

/// Renders prompts with a cancellation suffix.
///
/// Templates see `command`, `argument`, `keyword`, `seconds`, the resolved
/// arguments under `args`, and each resolved argument by its own key.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    suffix: String,
    cancellation: CancellationMessages,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CANCEL_SUFFIX, CancellationMessages::default())
    }
}

impl PromptRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new(suffix: impl Into<String>, cancellation: CancellationMessages) -> Self {
        Self {
            suffix: suffix.into(),
            cancellation,
        }
    }

    /// Renders `template` and appends the cancellation suffix.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Render`] when either template fails.
    pub fn render_prompt(
        &self,
        template: &str,
        ctx: &PromptContext<'_>,
    ) -> Result<String, PromptError> {
        let values = build_template_context(ctx);
        let body = render("prompt", ctx.argument, template, &values)?;
        self.with_suffix(body, ctx, &values)
    }

    /// Appends the cancellation suffix to text that is not a template, such
    /// as a resolver's rejection reason.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Render`] when the suffix template fails.
    pub fn render_raw(&self, text: &str, ctx: &PromptContext<'_>) -> Result<String, PromptError> {
        let values = build_template_context(ctx);
        self.with_suffix(text.to_owned(), ctx, &values)
    }

    fn with_suffix(
        &self,
        body: String,
        ctx: &PromptContext<'_>,
        values: &Map<String, Value>,
    ) -> Result<String, PromptError> {
        if self.suffix.trim().is_empty() {
            return Ok(body);
        }
        let suffix = render("suffix", ctx.argument, &self.suffix, values)?;
        Ok(format!("{body}\n{suffix}"))
    }

    /// Renders the reply for a cancelled invocation.
    ///
    /// Falls back to the reason's own wording when the template fails.
    #[must_use]
    pub fn render_cancellation(&self, command: &str, reason: &CancelReason) -> String {
        let (template, seconds, detail) = match reason {
            CancelReason::UserCancelled { .. } => (&self.cancellation.user_cancelled, 0, ""),
            CancelReason::TimedOut { after_ms, .. } => {
                (&self.cancellation.timed_out, after_ms.div_ceil(1000), "")
            }
            CancelReason::MissingArgument { .. } => (&self.cancellation.missing_argument, 0, ""),
            CancelReason::Requested { reason: why, .. } => {
                (&self.cancellation.requested, 0, why.as_str())
            }
        };
        let mut values = Map::new();
        values.insert("command".to_owned(), Value::String(command.to_owned()));
        values.insert(
            "argument".to_owned(),
            Value::String(reason.argument().to_owned()),
        );
        values.insert("seconds".to_owned(), Value::from(seconds));
        values.insert("reason".to_owned(), Value::String(detail.to_owned()));
        render("cancellation", reason.argument(), template, &values).unwrap_or_else(|error| {
            tracing::warn!(%error, "cancellation template failed, using default wording");
            reason.to_string()
        })
    }
}

fn render(
    template_kind: &'static str,
    argument: &str,
    template: &str,
    values: &Map<String, Value>,
) -> Result<String, PromptError> {
    let environment = Environment::new();
    environment
        .render_str(template, values)
        .map_err(|error| PromptError::Render {
            template: template_kind,
            argument: argument.to_owned(),
            reason: error.to_string(),
        })
}

fn build_template_context(ctx: &PromptContext<'_>) -> Map<String, Value> {
    let mut values = Map::new();
    for (key, value) in ctx.arguments.iter() {
        values.insert(key.to_owned(), value.clone());
    }
    values.insert("command".to_owned(), Value::String(ctx.command.to_owned()));
    values.insert(
        "argument".to_owned(),
        Value::String(ctx.argument.to_owned()),
    );
    values.insert("keyword".to_owned(), Value::String(ctx.keyword.to_owned()));
    values.insert("seconds".to_owned(), Value::from(ceil_seconds(ctx.timeout)));
    values.insert("args".to_owned(), Value::Object(ctx.arguments.to_json()));
    values
}

/// Whole seconds, rounded up, so a 1.5s timeout is announced as 2s.
pub(crate) const fn ceil_seconds(duration: Duration) -> u64 {
    let partial = if duration.subsec_nanos() > 0 { 1 } else { 0 };
    duration.as_secs().saturating_add(partial)
}
