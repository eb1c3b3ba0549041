//! Orchestrator - sequence the stages of one run according to its mode.
//!
//! ```text
//! parse_only   documents --fan-out--> aggregate --> [rank]
//! search_only  sources   --fan-out--> aggregate --> [rank]
//! full         documents --fan-out--+
//!                                   +--> aggregate --> [rank]
//!              sources   --fan-out--+   (both stages run concurrently)
//! rank_only    supplied records ----------------------> [rank]
//! ```
//!
//! Only request-level problems (unknown mode, missing input) are returned
//! as errors, and they are detected before any unit is launched. Everything
//! that fails afterwards is reported inside the `OrchestrationReport`.
//!
//! An `Orchestrator` holds no per-run state, so one instance can serve
//! overlapping `run` calls.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::aggregate::{Aggregation, StageOutputs, adopt_aggregated, aggregate};
use super::fan_out::{FanOut, FanOutReport};
use super::ranking::RankingEngine;
use super::status::{Stage, StageFailure, StageStatus};
use crate::config::OrchestratorSettings;
use crate::domain::{
    CoreError, CoreResult, EnvelopeSummary, Origin, RankingReport, Record, RunId, TargetSpec,
    TaskError, TaskKind,
};
use crate::ports::{Clock, IdGenerator, RecordParser, SearchRequest, SourceQuery, TextExtractor};

/// Attribute set on every record parsed from a document.
pub const SOURCE_FILE_KEY: &str = "source_file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    ParseOnly,
    SearchOnly,
    Full,
    RankOnly,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::ParseOnly => "parse_only",
            Mode::SearchOnly => "search_only",
            Mode::Full => "full",
            Mode::RankOnly => "rank_only",
        }
    }

    fn runs_parse(&self) -> bool {
        matches!(self, Mode::ParseOnly | Mode::Full)
    }

    fn runs_search(&self) -> bool {
        matches!(self, Mode::SearchOnly | Mode::Full)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "parse_only" => Ok(Mode::ParseOnly),
            "search_only" => Ok(Mode::SearchOnly),
            "full" | "full_search" => Ok(Mode::Full),
            "rank_only" => Ok(Mode::RankOnly),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

fn default_rank() -> bool {
    true
}

/// Inputs of one run. Which fields are required depends on `mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    pub mode: String,

    /// Documents to parse (`parse_only`, `full`).
    #[serde(default)]
    pub documents: Vec<PathBuf>,

    /// Query sent to every selected source (`search_only`, `full`).
    #[serde(default)]
    pub search: Option<SearchRequest>,

    /// Subset of registered sources to query; all of them when absent.
    #[serde(default)]
    pub sources: Option<Vec<String>>,

    /// Already aggregated records (`rank_only`).
    #[serde(default)]
    pub records: Option<Vec<Record>>,

    #[serde(default)]
    pub target: Option<TargetSpec>,

    /// Set to `false` to skip ranking even when a target is given.
    #[serde(default = "default_rank")]
    pub rank: bool,

    /// Shortlist length; the configured default when absent.
    #[serde(default)]
    pub shortlist_size: Option<usize>,
}

impl OrchestrationRequest {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            documents: Vec::new(),
            search: None,
            sources: None,
            records: None,
            target: None,
            rank: true,
            shortlist_size: None,
        }
    }

    pub fn with_documents<I, P>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.documents = documents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, search: SearchRequest) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = Some(target);
        self
    }

    pub fn without_ranking(mut self) -> Self {
        self.rank = false;
        self
    }

    pub fn with_shortlist_size(mut self, size: usize) -> Self {
        self.shortlist_size = Some(size);
        self
    }
}

/// Aggregate result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationReport {
    pub run_id: RunId,
    pub mode: Mode,

    /// False only when units were launched and every one of them failed.
    pub success: bool,

    /// True when any unit failed or any record carries a fallback score.
    pub degraded: bool,

    pub total_records: usize,
    pub records: Vec<Record>,
    pub ranking: Option<RankingReport>,

    /// Records per origin, in stage order.
    pub origin_counts: IndexMap<Origin, usize>,

    pub failures: Vec<StageFailure>,
    pub tasks: Vec<EnvelopeSummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A source registered with the orchestrator, keyed by its origin tag.
#[derive(Clone)]
pub(crate) struct RegisteredSource {
    pub(crate) origin: Origin,
    pub(crate) query: Arc<dyn SourceQuery>,
}

/// What a validated request will launch.
struct Plan<'a> {
    mode: Mode,
    documents: &'a [PathBuf],
    search: Option<SearchRequest>,
    sources: Vec<&'a RegisteredSource>,
    supplied: Option<Aggregation>,
}

pub struct Orchestrator {
    extractor: Arc<dyn TextExtractor>,
    parser: Arc<dyn RecordParser>,
    sources: Vec<RegisteredSource>,
    fan_out: FanOut,
    ranking: RankingEngine,
    ids: Arc<dyn IdGenerator>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub(crate) fn new(
        extractor: Arc<dyn TextExtractor>,
        parser: Arc<dyn RecordParser>,
        sources: Vec<RegisteredSource>,
        fan_out: FanOut,
        ranking: RankingEngine,
        ids: Arc<dyn IdGenerator>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            extractor,
            parser,
            sources,
            fan_out,
            ranking,
            ids,
            settings,
        }
    }

    /// Registered source names, in registration order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.origin.as_tag()).collect()
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.fan_out.runner().clock()
    }

    #[instrument(skip_all, fields(mode = %request.mode, run_id))]
    pub async fn run(&self, request: OrchestrationRequest) -> CoreResult<OrchestrationReport> {
        let mode: Mode = request.mode.parse()?;
        let Plan {
            mode,
            documents,
            search,
            sources,
            supplied,
        } = self.plan(mode, &request)?;

        let run_id = self.ids.generate_run_id();
        tracing::Span::current().record("run_id", tracing::field::display(&run_id));
        let started_at = self.clock().now();
        info!(
            documents = documents.len(),
            sources = sources.len(),
            "run started"
        );

        let mut status = StageStatus::default();
        let aggregation = match supplied {
            Some(supplied) => supplied,
            None => {
                let (parsed, searched) = tokio::join!(
                    async {
                        if documents.is_empty() {
                            None
                        } else {
                            Some(self.parse_documents(documents).await)
                        }
                    },
                    async {
                        match &search {
                            Some(search) if !sources.is_empty() => {
                                Some(self.query_sources(search, &sources).await)
                            }
                            _ => None,
                        }
                    },
                );

                // stage order: uploaded documents first, then sources as registered
                let mut stages = StageOutputs::new();
                if let Some(report) = parsed {
                    status.record(Stage::Parse, report.summaries, &report.failures);
                    let records = report.successes.into_iter().map(|(_, r)| r).collect();
                    stages.insert(Origin::UploadedDocument, records);
                }
                if let Some(report) = searched {
                    status.record(Stage::Search, report.summaries, &report.failures);
                    for source in &sources {
                        stages.insert(source.origin.clone(), Vec::new());
                    }
                    for (_, (origin, records)) in report.successes {
                        stages.entry(origin).or_default().extend(records);
                    }
                }
                aggregate(stages)
            }
        };

        let ranking = match &request.target {
            Some(target) if request.rank && aggregation.total() > 0 => {
                let top_n = request
                    .shortlist_size
                    .unwrap_or(self.settings.shortlist_size);
                Some(
                    self.ranking
                        .rank_and_shortlist(aggregation.records.clone(), target, top_n)
                        .await,
                )
            }
            _ => {
                debug!(
                    has_target = request.target.is_some(),
                    rank = request.rank,
                    records = aggregation.total(),
                    "ranking skipped"
                );
                None
            }
        };

        let success = status.any_succeeded();
        let degraded =
            !status.failures.is_empty() || ranking.as_ref().is_some_and(RankingReport::is_degraded);
        let finished_at = self.clock().now();

        info!(
            success,
            degraded,
            total_records = aggregation.total(),
            failures = status.failures.len(),
            "run finished"
        );

        Ok(OrchestrationReport {
            run_id,
            mode,
            success,
            degraded,
            total_records: aggregation.total(),
            records: aggregation.records,
            ranking,
            origin_counts: aggregation.counts,
            failures: status.failures,
            tasks: status.tasks,
            started_at,
            finished_at,
        })
    }

    /// Validate the request against its mode. Nothing is launched here.
    fn plan<'a>(&'a self, mode: Mode, request: &'a OrchestrationRequest) -> CoreResult<Plan<'a>> {
        let missing = |detail: &str| CoreError::MissingInput {
            mode: mode.to_string(),
            detail: detail.to_string(),
        };

        let mut plan = Plan {
            mode,
            documents: &[],
            search: None,
            sources: Vec::new(),
            supplied: None,
        };

        if mode == Mode::RankOnly {
            let records = request
                .records
                .clone()
                .ok_or_else(|| missing("rank_only needs a record set"))?;
            plan.supplied = Some(adopt_aggregated(records)?);
            return Ok(plan);
        }

        if mode.runs_parse() {
            plan.documents = request.documents.as_slice();
        }
        if mode.runs_search() {
            if let Some(search) = &request.search {
                plan.sources = self.select_sources(request.sources.as_deref(), &missing)?;
                plan.search = Some(self.bounded(search));
            }
        }

        match mode {
            Mode::ParseOnly if plan.documents.is_empty() => {
                Err(missing("parse_only needs at least one document"))
            }
            Mode::SearchOnly if plan.search.is_none() => Err(missing("search_only needs a query")),
            Mode::SearchOnly if plan.sources.is_empty() => {
                Err(missing("search_only needs at least one registered source"))
            }
            Mode::Full if plan.documents.is_empty() && plan.search.is_none() => {
                Err(missing("full needs documents, a query, or both"))
            }
            _ => Ok(plan),
        }
    }

    fn select_sources<'a>(
        &'a self,
        names: Option<&[String]>,
        missing: &dyn Fn(&str) -> CoreError,
    ) -> CoreResult<Vec<&'a RegisteredSource>> {
        let Some(names) = names else {
            return Ok(self.sources.iter().collect());
        };
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.sources.iter().any(|s| s.origin.as_tag() == name.trim()))
        {
            return Err(missing(&format!("unknown source '{unknown}'")));
        }
        // registration order, whatever order the request names them in
        Ok(self
            .sources
            .iter()
            .filter(|s| names.iter().any(|n| n.trim() == s.origin.as_tag()))
            .collect())
    }

    /// Cap the request's limit at the configured per-source maximum.
    fn bounded(&self, search: &SearchRequest) -> SearchRequest {
        let max = self.settings.max_records_per_source;
        SearchRequest {
            limit: Some(search.limit.map_or(max, |limit| limit.min(max))),
            ..search.clone()
        }
    }

    async fn parse_documents(&self, documents: &[PathBuf]) -> FanOutReport<Record> {
        let extractor = &self.extractor;
        let parser = &self.parser;
        let units: Vec<_> = documents
            .iter()
            .map(|path| {
                let work = move || async move {
                    let text = extractor.extract(path).await?;
                    let mut record = parser.parse(&text).await?;
                    record.set_attribute(SOURCE_FILE_KEY, path.display().to_string());
                    Ok::<_, TaskError>(record)
                };
                (path.display().to_string(), work)
            })
            .collect();

        let report = self.fan_out.fan_out(TaskKind::DocumentParse, units).await;
        info!(
            stage = %Stage::Parse,
            succeeded = report.successes.len(),
            failed = report.failures.len(),
            "stage completed"
        );
        report
    }

    async fn query_sources(
        &self,
        search: &SearchRequest,
        sources: &[&RegisteredSource],
    ) -> FanOutReport<(Origin, Vec<Record>)> {
        let limit = search.limit.unwrap_or(self.settings.max_records_per_source);
        let units: Vec<_> = sources
            .iter()
            .map(|&source| {
                let work = move || async move {
                    let mut records = source.query.search(search).await?;
                    if records.len() > limit {
                        debug!(
                            source = %source.origin,
                            returned = records.len(),
                            limit,
                            "truncating source results"
                        );
                        records.truncate(limit);
                    }
                    Ok::<_, TaskError>((source.origin.clone(), records))
                };
                (source.origin.to_string(), work)
            })
            .collect();

        let report = self.fan_out.fan_out(TaskKind::SourceQuery, units).await;
        info!(
            stage = %Stage::Search,
            succeeded = report.successes.len(),
            failed = report.failures.len(),
            "stage completed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::builder::OrchestratorBuilder;
    use crate::domain::RankingStatus;
    use crate::impls::{KeywordScorer, StaticSource, UnavailableSource};
    use rstest::rstest;
    use serde_json::json;

    fn record(name: &str, title: &str) -> Record {
        Record::new()
            .with_attribute("name", name)
            .with_attribute("title", title)
    }

    fn orchestrator() -> Orchestrator {
        OrchestratorBuilder::new()
            .source(StaticSource::new(
                "linkedin",
                vec![record("Ada", "Rust Engineer"), record("Lin", "Rust Engineer")],
            ))
            .source(UnavailableSource::new("indeed", "connection refused"))
            .scorer(Arc::new(KeywordScorer::new()))
            .build()
            .unwrap()
    }

    #[rstest]
    #[case("parse_only", Mode::ParseOnly)]
    #[case("search_only", Mode::SearchOnly)]
    #[case("full", Mode::Full)]
    #[case("full_search", Mode::Full)]
    #[case("rank_only", Mode::RankOnly)]
    fn mode_parses(#[case] raw: &str, #[case] expected: Mode) {
        assert_eq!(raw.parse::<Mode>().unwrap(), expected);
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let err = orchestrator()
            .run(OrchestrationRequest::new("everything"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMode(m) if m == "everything"));
    }

    #[rstest]
    #[case::parse_without_documents(OrchestrationRequest::new("parse_only"))]
    #[case::search_without_query(OrchestrationRequest::new("search_only"))]
    #[case::full_without_anything(OrchestrationRequest::new("full"))]
    #[case::rank_without_records(OrchestrationRequest::new("rank_only"))]
    #[case::unknown_source(
        OrchestrationRequest::new("search_only")
            .with_search(SearchRequest::new("Rust"))
            .with_sources(["monster"])
    )]
    #[tokio::test]
    async fn missing_input_is_rejected(#[case] request: OrchestrationRequest) {
        let err = orchestrator().run(request).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingInput { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn search_only_reports_failed_source_without_aborting() {
        let report = orchestrator()
            .run(OrchestrationRequest::new("search_only").with_search(SearchRequest::new("Rust")))
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.degraded);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task_id, "indeed");
        assert_eq!(report.failures[0].kind, "source_unavailable");
        assert_eq!(report.tasks.len(), 2);
        assert_eq!(
            report.origin_counts.get(&Origin::source("indeed").unwrap()),
            Some(&0)
        );
        assert!(report.ranking.is_none());
    }

    #[tokio::test]
    async fn source_subset_only_queries_named_sources() {
        let report = orchestrator()
            .run(
                OrchestrationRequest::new("search_only")
                    .with_search(SearchRequest::new("Rust"))
                    .with_sources(["linkedin"]),
            )
            .await
            .unwrap();

        assert!(!report.degraded);
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.origin_counts.len(), 1);
    }

    #[tokio::test]
    async fn every_launched_unit_failing_is_not_success() {
        let report = orchestrator()
            .run(
                OrchestrationRequest::new("search_only")
                    .with_search(SearchRequest::new("Rust"))
                    .with_sources(["indeed"]),
            )
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.total_records, 0);
    }

    #[tokio::test]
    async fn search_limit_is_capped() {
        let mut search = SearchRequest::new("Rust");
        search.limit = Some(1);
        let report = orchestrator()
            .run(
                OrchestrationRequest::new("search_only")
                    .with_search(search)
                    .with_sources(["linkedin"]),
            )
            .await
            .unwrap();

        assert_eq!(report.total_records, 1);
    }

    #[tokio::test]
    async fn rank_only_ranks_supplied_records() {
        let records: Vec<Record> = serde_json::from_value(json!([
            {"name": "Ada", "origin": "linkedin", "skills": ["rust"]},
            {"name": "Lin", "origin": "uploaded_document", "skills": ["rust", "tokio"]}
        ]))
        .unwrap();
        let target = TargetSpec::new("Rust Engineer").with_required_skills(["rust", "tokio"]);

        let report = orchestrator()
            .run(
                OrchestrationRequest::new("rank_only")
                    .with_records(records)
                    .with_target(target)
                    .with_shortlist_size(1),
            )
            .await
            .unwrap();

        let ranking = report.ranking.unwrap();
        assert_eq!(ranking.status, RankingStatus::Ranked);
        assert_eq!(ranking.ranked[0].record.name(), Some("Lin"));
        assert_eq!(ranking.shortlist.unwrap().shortlist_size, 1);
        assert!(report.tasks.is_empty());
        assert!(report.success);
    }

    #[tokio::test]
    async fn ranking_can_be_disabled() {
        let report = orchestrator()
            .run(
                OrchestrationRequest::new("search_only")
                    .with_search(SearchRequest::new("Rust"))
                    .with_target(TargetSpec::new("Rust Engineer"))
                    .without_ranking(),
            )
            .await
            .unwrap();

        assert_eq!(report.total_records, 2);
        assert!(report.ranking.is_none());
    }

    #[tokio::test]
    async fn overlapping_runs_do_not_share_state() {
        let orchestrator = orchestrator();
        let request =
            OrchestrationRequest::new("search_only").with_search(SearchRequest::new("Rust"));

        let (a, b) = tokio::join!(
            orchestrator.run(request.clone()),
            orchestrator.run(request.with_sources(["linkedin"]))
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.failures.len(), 1);
        assert!(b.failures.is_empty());
        assert_eq!(a.total_records, b.total_records);
    }

    /// Extractor and source that each block until the other has started.
    struct Rendezvous(Arc<tokio::sync::Barrier>);

    #[async_trait::async_trait]
    impl TextExtractor for Rendezvous {
        async fn extract(
            &self,
            _path: &std::path::Path,
        ) -> Result<String, crate::domain::ExtractError> {
            self.0.wait().await;
            Ok("Ada Lovelace\nskills: rust".to_string())
        }
    }

    #[async_trait::async_trait]
    impl SourceQuery for Rendezvous {
        fn name(&self) -> &str {
            "linkedin"
        }

        async fn search(
            &self,
            _request: &SearchRequest,
        ) -> Result<Vec<Record>, crate::domain::SourceError> {
            self.0.wait().await;
            Ok(vec![record("Lin", "Rust Engineer")])
        }
    }

    #[tokio::test]
    async fn full_mode_runs_parse_and_search_stages_together() {
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let orchestrator = OrchestratorBuilder::new()
            .extractor(Arc::new(Rendezvous(Arc::clone(&barrier))))
            .source(Rendezvous(barrier))
            .scorer(Arc::new(KeywordScorer::new()))
            .build()
            .unwrap();

        let request = OrchestrationRequest::new("full")
            .with_documents(["ada.txt"])
            .with_search(SearchRequest::new("Rust"));
        let report = tokio::time::timeout(std::time::Duration::from_secs(3), orchestrator.run(request))
            .await
            .expect("stages ran one after the other")
            .unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.total_records, 2);
        assert_eq!(report.origin_counts.get(&Origin::UploadedDocument), Some(&1));
    }
}
