//! EnvelopeState - エンベロープのライフサイクル状態
//!
//! ```text
//! Initialized → Running → Completed | Failed
//! ```
//! 終端状態からの再実行は `Running` に戻します。

use serde::{Deserialize, Serialize};

/// Lifecycle state of a task envelope.
///
/// State transitions (per invocation):
/// - Initialized / Completed / Failed -> Running (on `run`)
/// - Running -> Completed (unit of work returned a payload)
/// - Running -> Failed (unit of work returned an error, timed out or panicked)
///
/// Completed and Failed end one invocation; the envelope can be run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeState {
    Initialized,
    Running,
    Completed,
    Failed,
}

impl EnvelopeState {
    /// Does this state end an invocation?
    pub fn is_terminal(self) -> bool {
        matches!(self, EnvelopeState::Completed | EnvelopeState::Failed)
    }

    /// Can a new invocation start from this state?
    pub fn can_start(self) -> bool {
        !matches!(self, EnvelopeState::Running)
    }
}
