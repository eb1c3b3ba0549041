//! OrchestratorBuilder - 配線と fail-fast な検証
//!
//! 協調者はここで一度だけ選ばれ、呼び出し側で名前から引くことはありません。
//! `build()` は動かない配線（scorer なし、同名ソース、不正な上限値）を
//! 実行前に拒否します。

use std::collections::HashSet;
use std::sync::Arc;

use super::fan_out::FanOut;
use super::orchestrator::{Orchestrator, RegisteredSource};
use super::ranking::RankingEngine;
use super::runner::TaskRunner;
use crate::config::{OrchestratorSettings, Settings};
use crate::domain::{CoreError, CoreResult, Origin};
use crate::impls::{FieldRecordParser, NeutralScorer, PlainTextExtractor};
use crate::ports::{
    Clock, IdGenerator, RecordParser, Scorer, SourceQuery, Summarizer, SystemClock,
    TextExtractor, UlidGenerator,
};

/// # 使用例
/// ```ignore
/// let orchestrator = OrchestratorBuilder::from_settings(&settings)
///     .source(StaticSource::new("linkedin", records))
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    settings: OrchestratorSettings,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    extractor: Arc<dyn TextExtractor>,
    parser: Arc<dyn RecordParser>,
    sources: Vec<Arc<dyn SourceQuery>>,
    scorer: Option<Arc<dyn Scorer>>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl OrchestratorBuilder {
    /// Local document handling, wall clock, no sources and no scorer.
    pub fn new() -> Self {
        Self {
            settings: OrchestratorSettings::default(),
            clock: Arc::new(SystemClock),
            ids: None,
            extractor: Arc::new(PlainTextExtractor::new()),
            parser: Arc::new(FieldRecordParser::new()),
            sources: Vec::new(),
            scorer: None,
            summarizer: None,
        }
    }

    /// Orchestrator settings plus the configured scoring backend.
    pub fn from_settings(settings: &Settings) -> Self {
        let (scorer, summarizer) = settings.scoring.backend.build();
        Self::new()
            .settings(settings.orchestrator.clone())
            .scorer(scorer)
            .summarizer(summarizer)
    }

    pub fn settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Defaults to ULIDs stamped from the builder's clock.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn RecordParser>) -> Self {
        self.parser = parser;
        self
    }

    /// ソースを登録。`name()` がレコードの origin タグになる
    pub fn source<S: SourceQuery + 'static>(self, source: S) -> Self {
        self.shared_source(Arc::new(source))
    }

    pub fn shared_source(mut self, source: Arc<dyn SourceQuery>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Defaults to a summarizer that makes no recommendation.
    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn build(self) -> CoreResult<Orchestrator> {
        let settings = Settings {
            orchestrator: self.settings,
            ..Settings::default()
        };
        settings.validate()?;
        let settings = settings.orchestrator;

        let scorer = self
            .scorer
            .ok_or_else(|| CoreError::Config("no scorer configured".to_string()))?;
        let summarizer = self
            .summarizer
            .unwrap_or_else(|| Arc::new(NeutralScorer::new()));

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        let mut sources = Vec::with_capacity(self.sources.len());
        for query in self.sources {
            let origin = Origin::source(query.name()).map_err(|err| {
                CoreError::Config(format!("invalid source name '{}': {err}", query.name()))
            })?;
            if !seen.insert(origin.clone()) {
                duplicates.push(origin.to_string());
                continue;
            }
            sources.push(RegisteredSource { origin, query });
        }
        if !duplicates.is_empty() {
            return Err(CoreError::Config(format!(
                "duplicate source names: {duplicates:?}"
            )));
        }

        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&self.clock))));
        let runner = TaskRunner::new(self.clock).with_timeout(settings.task_timeout());
        let fan_out = FanOut::new(runner, Some(settings.max_concurrency));
        let ranking = RankingEngine::new(fan_out.clone(), scorer, summarizer, Arc::clone(&ids));

        Ok(Orchestrator::new(
            self.extractor,
            self.parser,
            sources,
            fan_out,
            ranking,
            ids,
            settings,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringBackend;
    use crate::impls::{KeywordScorer, StaticSource, UnavailableSource};

    fn scorer() -> Arc<dyn Scorer> {
        Arc::new(KeywordScorer::new())
    }

    #[test]
    fn build_success() {
        let orchestrator = OrchestratorBuilder::new()
            .source(StaticSource::new("linkedin", vec![]))
            .source(UnavailableSource::new("indeed", "down"))
            .scorer(scorer())
            .build()
            .unwrap();
        assert_eq!(orchestrator.source_names(), vec!["linkedin", "indeed"]);
    }

    #[test]
    fn build_without_scorer_fails() {
        let result = OrchestratorBuilder::new().build();
        assert!(matches!(result, Err(CoreError::Config(msg)) if msg.contains("scorer")));
    }

    #[test]
    fn build_with_duplicate_sources_fails() {
        let result = OrchestratorBuilder::new()
            .source(StaticSource::new("linkedin", vec![]))
            .source(UnavailableSource::new("linkedin", "down"))
            .scorer(scorer())
            .build();
        assert!(matches!(result, Err(CoreError::Config(msg)) if msg.contains("linkedin")));
    }

    #[test]
    fn build_with_reserved_source_name_fails() {
        let result = OrchestratorBuilder::new()
            .source(StaticSource::new("uploaded_document", vec![]))
            .scorer(scorer())
            .build();
        assert!(matches!(result, Err(CoreError::Config(msg)) if msg.contains("uploaded_document")));
    }

    #[test]
    fn build_with_blank_source_name_fails() {
        let result = OrchestratorBuilder::new()
            .source(StaticSource::new("  ", vec![]))
            .scorer(scorer())
            .build();
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn build_with_invalid_settings_fails() {
        let settings = OrchestratorSettings {
            max_concurrency: 0,
            ..OrchestratorSettings::default()
        };
        let result = OrchestratorBuilder::new()
            .settings(settings)
            .scorer(scorer())
            .build();
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn from_settings_wires_configured_backend() {
        let mut settings = Settings::default();
        settings.scoring.backend = ScoringBackend::Neutral;
        settings.orchestrator.shortlist_size = 3;

        let orchestrator = OrchestratorBuilder::from_settings(&settings).build().unwrap();
        assert_eq!(orchestrator.settings().shortlist_size, 3);
    }
}
