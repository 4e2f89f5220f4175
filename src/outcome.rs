//! Settlement outcome records
//!
//! An [`Outcome`] is the immutable record of how one promise settled. The
//! collection engine produces one per input and `allSettled` fulfills with
//! them in input order.

use crate::error::{Error, Result};
use crate::runtime::Value;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Settle kind of an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Fulfilled,
    Rejected,
}

impl OutcomeKind {
    /// Status tag used by the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Fulfilled => "fulfilled",
            OutcomeKind::Rejected => "rejected",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = Error;

    fn from_str(status: &str) -> Result<Self> {
        match status {
            "fulfilled" => Ok(OutcomeKind::Fulfilled),
            "rejected" => Ok(OutcomeKind::Rejected),
            other => Err(Error::invalid_outcome_status(other)),
        }
    }
}

/// The recorded result of one settled promise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Fulfilled { value: Value },
    Rejected { reason: Value },
}

impl Outcome {
    /// Build an outcome from a status tag.
    ///
    /// Only `"fulfilled"` and `"rejected"` are recognised; anything else is a
    /// programming error and fails with an `InvalidArgument` error.
    pub fn new(status: &str, value_or_reason: impl Into<Value>) -> Result<Self> {
        let kind = status.parse::<OutcomeKind>()?;
        Ok(Self::from_kind(kind, value_or_reason))
    }

    pub fn from_kind(kind: OutcomeKind, value_or_reason: impl Into<Value>) -> Self {
        match kind {
            OutcomeKind::Fulfilled => Outcome::Fulfilled {
                value: value_or_reason.into(),
            },
            OutcomeKind::Rejected => Outcome::Rejected {
                reason: value_or_reason.into(),
            },
        }
    }

    pub fn fulfilled(value: impl Into<Value>) -> Self {
        Outcome::Fulfilled {
            value: value.into(),
        }
    }

    pub fn rejected(reason: impl Into<Value>) -> Self {
        Outcome::Rejected {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Fulfilled { .. } => OutcomeKind::Fulfilled,
            Outcome::Rejected { .. } => OutcomeKind::Rejected,
        }
    }

    pub fn status(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    /// The fulfilled value, `None` for a rejected outcome
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Fulfilled { value } => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }

    /// The rejection reason, `None` for a fulfilled outcome
    pub fn reason(&self) -> Option<&Value> {
        match self {
            Outcome::Rejected { reason } => Some(reason),
            Outcome::Fulfilled { .. } => None,
        }
    }

    /// The carried value or reason, whichever this outcome holds
    pub fn into_payload(self) -> Value {
        match self {
            Outcome::Fulfilled { value } => value,
            Outcome::Rejected { reason } => reason,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Fulfilled { value } => write!(f, "fulfilled({})", value),
            Outcome::Rejected { reason } => write!(f, "rejected({})", reason),
        }
    }
}
