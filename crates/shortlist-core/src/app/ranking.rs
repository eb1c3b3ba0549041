//! RankingEngine - score, order, rank and shortlist a record set.
//!
//! Ranking is total over its input: a record whose scoring call fails still
//! appears, carrying a fallback score block. Ordering is a stable sort on
//! `overall` (descending), so ties keep their input order, which in turn
//! is the aggregator's stage order.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::fan_out::FanOut;
use crate::domain::{
    Outcome, RankedRecord, RankingReport, RankingStatus, Record, ScoreBlock, Shortlist,
    TargetSpec, TaskEnvelope, TaskError, TaskKind,
};
use crate::ports::{IdGenerator, Scorer, Summarizer};

/// Message attached to a pass over an empty record set.
pub const NOTHING_TO_RANK: &str = "No records to rank";

pub struct RankingEngine {
    fan_out: FanOut,
    scorer: Arc<dyn Scorer>,
    summarizer: Arc<dyn Summarizer>,
    ids: Arc<dyn IdGenerator>,
}

impl RankingEngine {
    pub fn new(
        fan_out: FanOut,
        scorer: Arc<dyn Scorer>,
        summarizer: Arc<dyn Summarizer>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            fan_out,
            scorer,
            summarizer,
            ids,
        }
    }

    /// Score every record once, then order and rank them.
    #[instrument(skip_all, fields(records = records.len(), scorer = self.scorer.name()))]
    pub async fn rank(&self, records: Vec<Record>, spec: &TargetSpec) -> RankingReport {
        let pass_id = self.ids.generate_pass_id();

        if records.is_empty() {
            info!(%pass_id, "nothing to rank");
            return RankingReport {
                pass_id,
                status: RankingStatus::NothingToRank,
                message: Some(NOTHING_TO_RANK.to_string()),
                total_records: 0,
                ranked: Vec::new(),
                top_score: 0.0,
                average_score: 0.0,
                degraded_count: 0,
                shortlist: None,
            };
        }

        let scores = self.score_all(&records, spec).await;
        let ranked = order_and_rank(records, scores);

        let top_score = ranked.first().map_or(0.0, RankedRecord::overall);
        let average_score = mean(ranked.iter().map(RankedRecord::overall));
        let degraded_count = ranked.iter().filter(|r| r.score.is_degraded()).count();

        info!(
            %pass_id,
            top_score,
            average_score,
            degraded = degraded_count,
            "ranking completed"
        );

        RankingReport {
            pass_id,
            status: RankingStatus::Ranked,
            message: None,
            total_records: ranked.len(),
            ranked,
            top_score,
            average_score,
            degraded_count,
            shortlist: None,
        }
    }

    /// Take the first `top_n` ranked records and ask for a narrative summary
    /// over them. A failed summary leaves the shortlist intact with the
    /// error noted.
    #[instrument(skip_all, fields(ranked = ranked.len(), top_n = top_n))]
    pub async fn shortlist(
        &self,
        ranked: &[RankedRecord],
        top_n: usize,
        spec: &TargetSpec,
    ) -> Shortlist {
        let entries: Vec<RankedRecord> = ranked.iter().take(top_n).cloned().collect();
        let mut shortlist = Shortlist {
            total_reviewed: ranked.len(),
            shortlist_size: entries.len(),
            entries,
            summary: None,
            error: None,
        };

        if shortlist.entries.is_empty() {
            return shortlist;
        }

        let runner = self.fan_out.runner();
        let mut envelope = TaskEnvelope::new(
            "shortlist-summary",
            TaskKind::ShortlistSummary,
            runner.clock().now(),
        );
        let summarizer = &self.summarizer;
        let entries = &shortlist.entries;
        let outcome = runner
            .run(&mut envelope, || async move {
                summarizer
                    .summarize(entries, spec)
                    .await
                    .map_err(TaskError::from)
            })
            .await;

        match outcome {
            Outcome::Success { payload, .. } => shortlist.summary = Some(payload),
            Outcome::Failure { message, .. } => {
                warn!(error = %message, "shortlist summary unavailable");
                shortlist.error = Some(message);
            }
        }

        info!(shortlist_size = shortlist.shortlist_size, "shortlist generated");
        shortlist
    }

    /// `rank` followed by `shortlist`, with the shortlist attached to the
    /// report. An empty input yields no shortlist.
    pub async fn rank_and_shortlist(
        &self,
        records: Vec<Record>,
        spec: &TargetSpec,
        top_n: usize,
    ) -> RankingReport {
        let mut report = self.rank(records, spec).await;
        if report.status == RankingStatus::Ranked {
            report.shortlist = Some(self.shortlist(&report.ranked, top_n, spec).await);
        }
        report
    }

    async fn score_all(&self, records: &[Record], spec: &TargetSpec) -> Vec<ScoreBlock> {
        let scorer = &self.scorer;
        let units: Vec<_> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let work = move || async move {
                    scorer.score(record, spec).await.map_err(TaskError::from)
                };
                (format!("score-{i}"), work)
            })
            .collect();

        self.fan_out
            .fan_out_outcomes(TaskKind::RecordScore, units)
            .await
            .into_iter()
            .zip(records)
            .map(|(unit, record)| match unit.outcome {
                Outcome::Success { payload, .. } => payload,
                Outcome::Failure { message, .. } => {
                    warn!(
                        task_id = %unit.id,
                        record = record.name().unwrap_or("unknown"),
                        error = %message,
                        "scoring degraded; using fallback score"
                    );
                    ScoreBlock::fallback(message)
                }
            })
            .collect()
    }
}

/// Stable sort by `overall` descending, then dense 1-based ranks.
pub fn order_and_rank(records: Vec<Record>, scores: Vec<ScoreBlock>) -> Vec<RankedRecord> {
    let mut scored: Vec<RankedRecord> = records
        .into_iter()
        .zip(scores)
        .map(|(record, score)| RankedRecord {
            rank: 0,
            score,
            record,
        })
        .collect();

    // `sort_by` is stable: equal scores keep input order.
    scored.sort_by(|a, b| b.score.overall.total_cmp(&a.score.overall));

    for (i, entry) in scored.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    scored
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::runner::TaskRunner;
    use crate::domain::{ScoringError, SummaryError};
    use crate::ports::{SystemClock, UlidGenerator};
    use async_trait::async_trait;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores a record by its `score` attribute; fails when it is missing.
    struct AttributeScorer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Scorer for AttributeScorer {
        fn name(&self) -> &str {
            "attribute"
        }

        async fn score(&self, record: &Record, _spec: &TargetSpec) -> Result<ScoreBlock, ScoringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let overall = record
                .get("score")
                .and_then(Value::as_f64)
                .ok_or_else(|| ScoringError("no score attribute".into()))?;
            Ok(ScoreBlock::new(overall, "Good", Value::Null))
        }
    }

    struct FixedSummarizer(Result<Value, SummaryError>);

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(
            &self,
            _shortlist: &[RankedRecord],
            _spec: &TargetSpec,
        ) -> Result<Value, SummaryError> {
            self.0.clone()
        }
    }

    fn engine_with(summary: Result<Value, SummaryError>) -> (RankingEngine, Arc<AttributeScorer>) {
        let scorer = Arc::new(AttributeScorer {
            calls: AtomicUsize::new(0),
        });
        let fan_out = FanOut::new(TaskRunner::new(Arc::new(SystemClock)), Some(4));
        let engine = RankingEngine::new(
            fan_out,
            scorer.clone(),
            Arc::new(FixedSummarizer(summary)),
            Arc::new(UlidGenerator::new(SystemClock)),
        );
        (engine, scorer)
    }

    fn engine() -> RankingEngine {
        engine_with(Ok(json!({"summary": "strong pool"}))).0
    }

    fn scored(name: &str, score: f64) -> Record {
        Record::new().with_attribute("name", name).with_attribute("score", score)
    }

    fn unscorable(name: &str) -> Record {
        Record::new().with_attribute("name", name)
    }

    fn names(ranked: &[RankedRecord]) -> Vec<&str> {
        ranked.iter().map(|r| r.record.name().unwrap()).collect()
    }

    #[tokio::test]
    async fn orders_descending_with_dense_ranks() {
        let records = vec![scored("a", 70.0), scored("b", 95.0), scored("c", 85.0)];
        let report = engine().rank(records, &TargetSpec::new("x")).await;

        let overall: Vec<f64> = report.ranked.iter().map(RankedRecord::overall).collect();
        assert_eq!(overall, vec![95.0, 85.0, 70.0]);
        let ranks: Vec<usize> = report.ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(report.top_score, 95.0);
        assert!((report.average_score - 83.33).abs() < 0.01);
        assert_eq!(report.status, RankingStatus::Ranked);
    }

    #[tokio::test]
    async fn ties_keep_input_order() {
        let records = vec![
            scored("first", 80.0),
            scored("top", 90.0),
            scored("second", 80.0),
            scored("third", 80.0),
        ];
        let report = engine().rank(records, &TargetSpec::new("x")).await;

        assert_eq!(names(&report.ranked), vec!["top", "first", "second", "third"]);
    }

    #[tokio::test]
    async fn empty_input_is_nothing_to_rank() {
        let report = engine().rank(vec![], &TargetSpec::new("x")).await;

        assert_eq!(report.status, RankingStatus::NothingToRank);
        assert_eq!(report.message.as_deref(), Some(NOTHING_TO_RANK));
        assert!(report.ranked.is_empty());
        assert_eq!(report.top_score, 0.0);
        assert_eq!(report.average_score, 0.0);
    }

    #[tokio::test]
    async fn failed_scores_fall_back_and_stay_in_ranking() {
        let records = vec![scored("a", 60.0), unscorable("b"), scored("c", 40.0)];
        let (engine, scorer) = engine_with(Ok(Value::Null));
        let report = engine.rank(records, &TargetSpec::new("x")).await;

        assert_eq!(report.ranked.len(), 3);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 3);
        assert_eq!(names(&report.ranked), vec!["a", "b", "c"]);

        let fallback = &report.ranked[1].score;
        assert!(fallback.is_degraded());
        assert_eq!(fallback.overall, 50.0);
        assert_eq!(fallback.quality, "unknown");
        assert_eq!(fallback.error.as_deref(), Some("scoring failed: no score attribute"));
        assert_eq!(report.degraded_count, 1);
        assert!(report.is_degraded());
    }

    #[tokio::test]
    async fn ranking_is_total_when_every_score_fails() {
        let records = vec![unscorable("a"), unscorable("b"), unscorable("c")];
        let report = engine().rank(records, &TargetSpec::new("x")).await;

        assert_eq!(report.ranked.len(), 3);
        assert_eq!(names(&report.ranked), vec!["a", "b", "c"]);
        assert_eq!(report.average_score, 50.0);
        assert_eq!(report.degraded_count, 3);
    }

    #[rstest]
    #[case::smaller_than_pool(2, 2)]
    #[case::equal_to_pool(4, 4)]
    #[case::larger_than_pool(10, 4)]
    #[case::zero(0, 0)]
    #[tokio::test]
    async fn shortlist_is_a_bounded_prefix(#[case] top_n: usize, #[case] expected: usize) {
        let engine = engine();
        let spec = TargetSpec::new("x");
        let records = vec![
            scored("a", 10.0),
            scored("b", 40.0),
            scored("c", 30.0),
            scored("d", 20.0),
        ];
        let report = engine.rank(records, &spec).await;
        let shortlist = engine.shortlist(&report.ranked, top_n, &spec).await;

        assert_eq!(shortlist.shortlist_size, expected);
        assert_eq!(shortlist.entries.len(), expected);
        assert_eq!(shortlist.total_reviewed, 4);
        assert_eq!(shortlist.entries[..], report.ranked[..expected]);
    }

    #[tokio::test]
    async fn summary_failure_keeps_shortlist() {
        let (engine, _) = engine_with(Err(SummaryError("model overloaded".into())));
        let spec = TargetSpec::new("x");
        let report = engine
            .rank_and_shortlist(vec![scored("a", 90.0), scored("b", 80.0)], &spec, 1)
            .await;

        let shortlist = report.shortlist.expect("shortlist attached");
        assert_eq!(names(&shortlist.entries), vec!["a"]);
        assert!(shortlist.summary.is_none());
        assert_eq!(shortlist.error.as_deref(), Some("summary failed: model overloaded"));
    }

    #[tokio::test]
    async fn summary_is_attached_on_success() {
        let report = engine()
            .rank_and_shortlist(vec![scored("a", 90.0)], &TargetSpec::new("x"), 5)
            .await;

        let shortlist = report.shortlist.unwrap();
        assert_eq!(shortlist.summary, Some(json!({"summary": "strong pool"})));
        assert!(shortlist.error.is_none());
    }

    #[test]
    fn order_and_rank_is_a_contiguous_permutation() {
        let records: Vec<Record> = (0..7).map(|i| unscorable(&format!("r{i}"))).collect();
        let scores: Vec<ScoreBlock> = [3.0, 9.0, 3.0, 1.0, 9.0, 5.0, 0.0]
            .into_iter()
            .map(|s| ScoreBlock::new(s, "x", Value::Null))
            .collect();

        let ranked = order_and_rank(records, scores);

        let mut ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=7).collect::<Vec<_>>());
        assert_eq!(names(&ranked), vec!["r1", "r4", "r5", "r0", "r2", "r3", "r6"]);
    }
}
