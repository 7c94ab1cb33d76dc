//! Middleware validation outcomes.

use serde::{Deserialize, Serialize};

/// Outcome of one middleware step.
///
/// An invalid result carries the reason shown to the user unless it is
/// suppressed, in which case the invocation is rejected silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    valid: bool,
    reason: Option<String>,
    suppressed: bool,
}

impl ValidationResult {
    /// The invocation may proceed.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
            suppressed: false,
        }
    }

    /// The invocation is rejected with a user-facing reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            suppressed: false,
        }
    }

    /// The invocation is rejected without a reply.
    #[must_use]
    pub const fn suppressed() -> Self {
        Self {
            valid: false,
            reason: None,
            suppressed: true,
        }
    }

    /// Returns whether the invocation may proceed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the rejection reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns whether the rejection must not be answered.
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}
