//! Lifecycle tag carried by every message.
//!
//! `Working` is the only non-terminal state. Drivers move a message to one
//! of the terminal outcomes; retryable outcomes (and `Free`, for reuse) may
//! return to `Working`. `Fatal` is absorbing.

use std::fmt;

use crate::error::{MessageError, Result};

/// Coarse outcome of sending or receiving a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Being built, sent or received.
    #[default]
    Working,
    /// Reclaimable.
    Free,
    /// Delivered and acknowledged.
    Success,
    /// An expected response never arrived.
    Missing,
    /// Integrity or protocol fault on this attempt.
    Error,
    /// Abandon this message.
    Fatal,
}

impl Outcome {
    /// True for every state except `Working`.
    pub fn is_terminal(self) -> bool {
        self != Outcome::Working
    }

    /// True for outcomes a caller may retry.
    pub fn is_retryable(self) -> bool {
        matches!(self, Outcome::Success | Outcome::Missing | Outcome::Error)
    }

    /// Whether moving from `self` to `to` is allowed. Any state may escalate
    /// to `Fatal`, which is only left by staying put.
    pub fn can_transition(self, to: Outcome) -> bool {
        if self == to {
            return true;
        }
        match self {
            Outcome::Working => true,
            Outcome::Fatal => false,
            _ => matches!(to, Outcome::Working | Outcome::Fatal),
        }
    }

    /// Validate a transition and return the new state.
    pub fn transition(self, to: Outcome) -> Result<Outcome> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(MessageError::InvalidTransition { from: self, to })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Working => "WORKING",
            Outcome::Free => "FREE",
            Outcome::Success => "SUCCESS",
            Outcome::Missing => "MISSING",
            Outcome::Error => "ERROR",
            Outcome::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
