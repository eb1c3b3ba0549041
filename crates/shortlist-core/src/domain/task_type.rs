//! TaskKind - タスク種別タグ
//!
//! 命名規則: `{namespace}.{domain}.{action}.v{major}`

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work an envelope wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "shortlist.document.parse.v1")]
    DocumentParse,
    #[serde(rename = "shortlist.source.query.v1")]
    SourceQuery,
    #[serde(rename = "shortlist.record.score.v1")]
    RecordScore,
    #[serde(rename = "shortlist.shortlist.summarize.v1")]
    ShortlistSummary,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::DocumentParse => "shortlist.document.parse.v1",
            TaskKind::SourceQuery => "shortlist.source.query.v1",
            TaskKind::RecordScore => "shortlist.record.score.v1",
            TaskKind::ShortlistSummary => "shortlist.shortlist.summarize.v1",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
