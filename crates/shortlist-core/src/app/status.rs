//! Status - 実行中に何が失敗したかをステージ別に説明

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{EnvelopeSummary, TaskError};

/// Fan-out stage of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Search,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Parse => "parse",
            Stage::Search => "search",
        })
    }
}

/// One failed unit, reported alongside the run's successful output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub task_id: String,
    pub kind: String,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: Stage, task_id: impl Into<String>, error: &TaskError) -> Self {
        Self {
            stage,
            task_id: task_id.into(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Stage-level view of one run: every launched unit plus the failed ones.
#[derive(Debug, Clone, Default)]
pub struct StageStatus {
    pub tasks: Vec<EnvelopeSummary>,
    pub failures: Vec<StageFailure>,
}

impl StageStatus {
    pub fn record(&mut self, stage: Stage, summaries: Vec<EnvelopeSummary>, failures: &[(String, TaskError)]) {
        self.tasks.extend(summaries);
        self.failures
            .extend(failures.iter().map(|(id, err)| StageFailure::new(stage, id.clone(), err)));
    }

    pub fn launched(&self) -> usize {
        self.tasks.len()
    }

    /// True unless units were launched and none of them succeeded.
    pub fn any_succeeded(&self) -> bool {
        self.tasks.is_empty() || self.failures.len() < self.tasks.len()
    }
}
