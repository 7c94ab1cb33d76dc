//! Triggers that map message text onto commands.
//!
//! Case sensitivity follows one rule everywhere: a trigger whose source text
//! contains an uppercase character matches case-sensitively, any other
//! trigger matches case-insensitively.

use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

use super::InboundMessage;

/// Predicate deciding whether a message body triggers a command.
pub type TriggerPredicate = Arc<dyn Fn(&InboundMessage, &str) -> bool + Send + Sync>;

/// Returns whether matching against `source` must be case-sensitive.
#[must_use]
pub fn is_case_sensitive(source: &str) -> bool {
    source.chars().any(char::is_uppercase)
}

/// Strips `literal` from the start of `text` using the case rule.
///
/// Returns the text following the literal, untrimmed.
pub(crate) fn strip_literal<'a>(
    text: &'a str,
    literal: &str,
    case_sensitive: bool,
) -> Option<&'a str> {
    let head = text.get(..literal.len())?;
    let matches = if case_sensitive {
        head == literal
    } else {
        head.to_lowercase() == literal.to_lowercase()
    };
    if !matches {
        return None;
    }
    text.get(literal.len()..)
}

/// The outcome of matching one trigger against a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerHit {
    /// Text that matched the trigger.
    pub matched: String,
    /// Body left over for argument collection, trimmed.
    pub remainder: String,
}

/// A trigger that causes a message to match a command.
#[derive(Clone)]
pub enum Trigger {
    /// Word-boundary literal at the start of the body.
    Literal {
        /// Literal text.
        text: String,
        /// Whether comparison is case-sensitive.
        case_sensitive: bool,
    },
    /// Regular expression matched anywhere in the body.
    Pattern(Regex),
    /// Custom predicate over the message and body.
    Predicate {
        /// Name used in diagnostics.
        name: String,
        /// Predicate function.
        predicate: TriggerPredicate,
    },
}

impl Trigger {
    /// Creates a literal trigger, applying the case rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley::dispatch::domain::{InboundMessage, Trigger};
    ///
    /// let message = InboundMessage::new("m-1", "alice", "general", "BAN bob");
    /// let hit = Trigger::literal("ban").matches(&message, "BAN bob").expect("matches");
    /// assert_eq!(hit.remainder, "bob");
    /// assert!(Trigger::literal("Ban").matches(&message, "BAN bob").is_none());
    /// ```
    #[must_use]
    pub fn literal(source: impl Into<String>) -> Self {
        let text = source.into().trim().to_owned();
        let case_sensitive = is_case_sensitive(&text);
        Self::Literal {
            text,
            case_sensitive,
        }
    }

    /// Compiles a pattern trigger, applying the case rule to the source.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the pattern does not compile.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(!is_case_sensitive(source))
            .build()?;
        Ok(Self::Pattern(regex))
    }

    /// Wraps an already compiled regular expression verbatim.
    #[must_use]
    pub const fn regex(regex: Regex) -> Self {
        Self::Pattern(regex)
    }

    /// Creates a predicate trigger.
    #[must_use]
    pub fn predicate(
        name: impl Into<String>,
        predicate: impl Fn(&InboundMessage, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Predicate {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns the literal text when this is a literal trigger.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal { text, .. } => Some(text),
            Self::Pattern(_) | Self::Predicate { .. } => None,
        }
    }

    /// Returns the key two literal triggers collide on.
    #[must_use]
    pub fn literal_key(&self) -> Option<String> {
        match self {
            Self::Literal {
                text,
                case_sensitive: true,
            } => Some(text.clone()),
            Self::Literal { text, .. } => Some(text.to_lowercase()),
            Self::Pattern(_) | Self::Predicate { .. } => None,
        }
    }

    /// Tests the trigger against a message body.
    ///
    /// A literal must be followed by whitespace or the end of the body. A
    /// pattern removes its match from the body. A predicate leaves the body
    /// untouched.
    #[must_use]
    pub fn matches(&self, message: &InboundMessage, raw_body: &str) -> Option<TriggerHit> {
        let body = raw_body.trim();
        match self {
            Self::Literal {
                text,
                case_sensitive,
            } => {
                if text.is_empty() {
                    return None;
                }
                let rest = strip_literal(body, text, *case_sensitive)?;
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                Some(TriggerHit {
                    matched: body.get(..text.len()).unwrap_or(text).to_owned(),
                    remainder: rest.trim().to_owned(),
                })
            }
            Self::Pattern(regex) => {
                let found = regex.find(body)?;
                let before = body.get(..found.start()).unwrap_or_default().trim_end();
                let after = body.get(found.end()..).unwrap_or_default().trim_start();
                let remainder = match (before.is_empty(), after.is_empty()) {
                    (true, _) => after.to_owned(),
                    (false, true) => before.to_owned(),
                    (false, false) => format!("{before} {after}"),
                };
                Some(TriggerHit {
                    matched: found.as_str().to_owned(),
                    remainder,
                })
            }
            Self::Predicate { predicate, .. } => {
                predicate(message, body).then(|| TriggerHit {
                    matched: String::new(),
                    remainder: body.to_owned(),
                })
            }
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal {
                text,
                case_sensitive,
            } => f
                .debug_struct("Literal")
                .field("text", text)
                .field("case_sensitive", case_sensitive)
                .finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate { name, .. } => {
                f.debug_struct("Predicate").field("name", name).finish()
            }
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { text, .. } => f.write_str(text),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            Self::Predicate { name, .. } => write!(f, "<{name}>"),
        }
    }
}

impl From<&str> for Trigger {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}
