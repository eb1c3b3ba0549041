//! Domain errors
//!
//! # 2 層構成
//! - 協調者のエラー（`ExtractError`, `SourceError`, `ScoringError`,
//!   `SummaryError`）と、それを包んで `Outcome` に載せる `TaskError`。
//!   fan-out の外には出ない。
//! - `CoreError`: オーケストレーターの呼び出し側が受け取る唯一のエラー。
//!   リクエスト・設定レベルの拒否を表す。

use thiserror::Error;

/// Text extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Source query failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source {source_name} unavailable: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },
}

/// Scoring collaborator failure for one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scoring failed: {0}")]
pub struct ScoringError(pub String);

/// Narrative summary failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("summary failed: {0}")]
pub struct SummaryError(pub String);

/// The originating error of a failed unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    #[error("unit of work panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

impl TaskError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Short classification used in logs and failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Extract(ExtractError::UnsupportedFormat(_)) => "unsupported_format",
            TaskError::Extract(_) => "extraction_error",
            TaskError::Source(_) => "source_unavailable",
            TaskError::Scoring(_) => "scoring_error",
            TaskError::Summary(_) => "summary_error",
            TaskError::TimedOut { .. } => "timed_out",
            TaskError::Panicked(_) => "panicked",
            TaskError::Other(_) => "other",
        }
    }
}

/// Caller-visible errors. A `run` only returns these before any task is
/// launched (or when wiring is broken).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid orchestration mode '{0}' (expected parse_only, search_only, full or rank_only)")]
    InvalidMode(String),

    #[error("missing input for mode {mode}: {detail}")]
    MissingInput { mode: String, detail: String },

    #[error("record without determinable origin: {0}")]
    AggregationInconsistency(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
