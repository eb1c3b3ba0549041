//! Outcome model: the common result shape of one unit of work.
//!
//! This module is architecture-agnostic: it does not assume fan-out,
//! ranking or any particular collaborator. It only defines what a finished
//! unit of work looks like so the runner can record it and the caller can
//! explain it later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::TaskError;

/// Classification of an outcome.
///
/// Serialized as SCREAMING_SNAKE_CASE: SUCCESS / FAILURE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Result of one invocation of a unit of work. Exactly one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success {
        payload: T,
        at: DateTime<Utc>,
    },
    Failure {
        /// The originating error's message, preserved verbatim.
        message: String,
        error: TaskError,
        at: DateTime<Utc>,
    },
}

impl<T> Outcome<T> {
    pub fn success(payload: T, at: DateTime<Utc>) -> Self {
        Outcome::Success { payload, at }
    }

    pub fn failure(error: TaskError, at: DateTime<Utc>) -> Self {
        Outcome::Failure {
            message: error.to_string(),
            error,
            at,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success { .. } => OutcomeKind::Success,
            Outcome::Failure { .. } => OutcomeKind::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Outcome::Success { at, .. } | Outcome::Failure { at, .. } => *at,
        }
    }

    /// Convert into a plain `Result`, dropping the timestamp.
    pub fn into_result(self) -> Result<T, TaskError> {
        match self {
            Outcome::Success { payload, .. } => Ok(payload),
            Outcome::Failure { error, .. } => Err(error),
        }
    }
}
