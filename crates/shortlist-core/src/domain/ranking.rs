//! Ranking results: ranked records, shortlist and the pass report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::PassId;
use super::record::Record;
use super::score::ScoreBlock;

/// A record with its score and dense 1-based rank.
///
/// The record stays nested: its attributes are opaque and may use any key,
/// including `rank` and `score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub rank: usize,
    pub score: ScoreBlock,
    pub record: Record,
}

impl RankedRecord {
    pub fn overall(&self) -> f64 {
        self.score.overall
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStatus {
    Ranked,
    /// The input was empty. Not an error.
    NothingToRank,
}

/// Bounded prefix of a ranking plus its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortlist {
    pub entries: Vec<RankedRecord>,
    pub total_reviewed: usize,
    pub shortlist_size: usize,

    /// Narrative summary; absent when the summary call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub pass_id: PassId,
    pub status: RankingStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub total_records: usize,
    pub ranked: Vec<RankedRecord>,
    pub top_score: f64,
    pub average_score: f64,

    /// Number of records carrying a fallback score block.
    pub degraded_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortlist: Option<Shortlist>,
}

impl RankingReport {
    pub fn is_degraded(&self) -> bool {
        self.degraded_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ranked() -> RankedRecord {
        let record: Record = serde_json::from_value(json!({
            "name": "a",
            "origin": "linkedin",
            "score": 40,
            "rank": 7
        }))
        .unwrap();
        RankedRecord {
            rank: 1,
            score: ScoreBlock::new(90.0, "Excellent", Value::Null),
            record,
        }
    }

    #[test]
    fn colliding_attributes_do_not_shadow_rank_or_score() {
        let v = serde_json::to_value(ranked()).unwrap();
        assert_eq!(v["rank"], 1);
        assert_eq!(v["score"]["overall"], 90.0);
        assert_eq!(v["record"]["rank"], 7);
        assert_eq!(v["record"]["score"], 40);
        assert_eq!(v["record"]["origin"], "linkedin");
    }

    #[test]
    fn survives_a_json_round_trip() {
        let original = ranked();
        let text = serde_json::to_string(&original).unwrap();
        let back: RankedRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
        assert_eq!(back.record.get("rank"), Some(&json!(7)));
    }
}
