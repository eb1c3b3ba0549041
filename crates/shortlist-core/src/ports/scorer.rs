//! Scoring ports - ランキングエンジンが使う外部の判断
//!
//! エンジンが読むのは `ScoreBlock::overall` だけです。
//! スコアの算出方法はバックエンド側の責務です。

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::{ScoringError, SummaryError};
use crate::domain::ranking::RankedRecord;
use crate::domain::record::Record;
use crate::domain::score::ScoreBlock;
use crate::domain::target::TargetSpec;

#[async_trait]
pub trait Scorer: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &str;

    async fn score(&self, record: &Record, spec: &TargetSpec) -> Result<ScoreBlock, ScoringError>;
}

/// Summarizer はショートリストの要約を作る（best-effort）
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        shortlist: &[RankedRecord],
        spec: &TargetSpec,
    ) -> Result<Value, SummaryError>;
}
