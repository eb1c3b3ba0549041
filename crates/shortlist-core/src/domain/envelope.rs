//! TaskEnvelope - 一様なライフサイクルを持つ作業単位
//!
//! エンベロープは状態と結果ログ・エラーログを排他的に所有します。
//! ログは追記のみで、書き換えはしません。遷移は runner（`app::runner`）が
//! 行い、呼び出し側が直接動かすことはありません。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::TaskError;
use super::state::EnvelopeState;
use super::task_type::TaskKind;

/// A recorded successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry<T> {
    pub payload: T,
    pub at: DateTime<Utc>,
}

/// A recorded failed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    pub message: String,
    pub error: TaskError,
    pub at: DateTime<Utc>,
}

/// Observable status of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSummary {
    pub id: String,
    pub task_type: TaskKind,
    pub state: EnvelopeState,
    pub created_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub results_count: usize,
    pub errors_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TaskEnvelope<T> {
    id: String,
    kind: TaskKind,
    state: EnvelopeState,
    created_at: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
    results: Vec<ResultEntry<T>>,
    errors: Vec<ErrorEntry>,
}

impl<T> TaskEnvelope<T> {
    pub fn new(id: impl Into<String>, kind: TaskKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            state: EnvelopeState::Initialized,
            created_at,
            last_run: None,
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn results(&self) -> &[ResultEntry<T>] {
        &self.results
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn summary(&self) -> EnvelopeSummary {
        EnvelopeSummary {
            id: self.id.clone(),
            task_type: self.kind,
            state: self.state,
            created_at: self.created_at,
            last_run: self.last_run,
            results_count: self.results.len(),
            errors_count: self.errors.len(),
            last_error: self.errors.last().map(|e| e.message.clone()),
        }
    }

    /// 新しい実行のために `Running` に入る
    pub(crate) fn start(&mut self, at: DateTime<Utc>) {
        debug_assert!(self.state.can_start(), "envelope {} already running", self.id);
        self.state = EnvelopeState::Running;
        self.last_run = Some(at);
    }

    /// Running -> Completed, appending exactly one result entry.
    pub(crate) fn complete(&mut self, payload: T, at: DateTime<Utc>) {
        self.state = EnvelopeState::Completed;
        self.results.push(ResultEntry { payload, at });
    }

    /// Running -> Failed, appending exactly one error entry.
    pub(crate) fn fail(&mut self, error: TaskError, at: DateTime<Utc>) {
        self.state = EnvelopeState::Failed;
        self.errors.push(ErrorEntry {
            message: error.to_string(),
            error,
            at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    #[test]
    fn new_envelope_is_initialized() {
        let env: TaskEnvelope<u32> = TaskEnvelope::new("parse-0", TaskKind::DocumentParse, t(0));
        let summary = env.summary();

        assert_eq!(summary.state, EnvelopeState::Initialized);
        assert_eq!(summary.task_type, TaskKind::DocumentParse);
        assert_eq!(summary.created_at, t(0));
        assert_eq!(summary.last_run, None);
        assert_eq!(summary.results_count, 0);
        assert_eq!(summary.errors_count, 0);
    }

    #[test]
    fn logs_grow_across_invocations() {
        let mut env = TaskEnvelope::new("q", TaskKind::SourceQuery, t(0));

        env.start(t(1));
        env.complete(1, t(2));
        assert_eq!(env.state(), EnvelopeState::Completed);

        env.start(t(3));
        assert_eq!(env.state(), EnvelopeState::Running);
        env.fail(TaskError::other("boom"), t(4));
        assert_eq!(env.state(), EnvelopeState::Failed);

        env.start(t(5));
        env.complete(2, t(6));

        let payloads: Vec<_> = env.results().iter().map(|r| r.payload).collect();
        assert_eq!(payloads, vec![1, 2]);
        assert_eq!(env.errors().len(), 1);
        assert_eq!(env.errors()[0].message, "boom");
        assert_eq!(env.last_run(), Some(t(5)));

        let summary = env.summary();
        assert_eq!(summary.results_count, 2);
        assert_eq!(summary.errors_count, 1);
        assert_eq!(summary.last_error.as_deref(), Some("boom"));
    }
}
