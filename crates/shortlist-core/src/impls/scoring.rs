//! Scoring backends.
//!
//! The backend is picked once from configuration (`ScoringBackend::build`);
//! call sites only ever see `dyn Scorer` / `dyn Summarizer`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::ScoringBackend;
use crate::domain::{RankedRecord, Record, ScoreBlock, ScoringError, SummaryError, TargetSpec};
use crate::ports::{Scorer, Summarizer};

const REQUIRED_WEIGHT: f64 = 60.0;
const PREFERRED_WEIGHT: f64 = 25.0;
const EXPERIENCE_WEIGHT: f64 = 15.0;

/// Attribute keys read as years of experience, first match wins.
const EXPERIENCE_KEYS: &[&str] = &["years_experience", "experience_years", "years"];

impl ScoringBackend {
    pub fn build(self) -> (Arc<dyn Scorer>, Arc<dyn Summarizer>) {
        match self {
            ScoringBackend::Keyword => {
                let backend = Arc::new(KeywordScorer::new());
                (backend.clone(), backend)
            }
            ScoringBackend::Neutral => {
                let backend = Arc::new(NeutralScorer::new());
                (backend.clone(), backend)
            }
        }
    }
}

pub fn quality_band(overall: f64) -> &'static str {
    match overall {
        s if s >= 85.0 => "Excellent",
        s if s >= 70.0 => "Good",
        s if s >= 50.0 => "Fair",
        _ => "Poor",
    }
}

/// Deterministic skill/experience overlap.
///
/// | component        | points | awarded for                           |
/// |------------------|--------|---------------------------------------|
/// | required skills  | 60     | share of required skills present      |
/// | preferred skills | 25     | share of preferred skills present     |
/// | experience       | 15     | years relative to the minimum         |
///
/// An empty requirement list awards its full points.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    pub fn new() -> Self {
        Self
    }
}

fn skills_of(record: &Record) -> HashSet<String> {
    match record.get("skills") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .collect(),
        Some(Value::String(s)) => s.split(',').map(|s| s.trim().to_lowercase()).collect(),
        _ => HashSet::new(),
    }
}

fn years_of(record: &Record) -> Option<f64> {
    EXPERIENCE_KEYS
        .iter()
        .find_map(|key| record.get(key))
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

/// `(points, matched, missing)` for one skill list.
fn overlap(wanted: &[String], have: &HashSet<String>, weight: f64) -> (f64, Vec<String>, Vec<String>) {
    if wanted.is_empty() {
        return (weight, Vec::new(), Vec::new());
    }
    let (matched, missing): (Vec<String>, Vec<String>) = wanted
        .iter()
        .cloned()
        .partition(|skill| have.contains(&skill.trim().to_lowercase()));
    let points = weight * matched.len() as f64 / wanted.len() as f64;
    (points, matched, missing)
}

#[async_trait]
impl Scorer for KeywordScorer {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn score(&self, record: &Record, spec: &TargetSpec) -> Result<ScoreBlock, ScoringError> {
        let have = skills_of(record);
        let (required, required_matched, required_missing) =
            overlap(&spec.required_skills, &have, REQUIRED_WEIGHT);
        let (preferred, preferred_matched, _) =
            overlap(&spec.preferred_skills, &have, PREFERRED_WEIGHT);

        let years = years_of(record);
        let experience = match (spec.min_years_experience, years) {
            (None, _) | (Some(0), _) => EXPERIENCE_WEIGHT,
            (Some(min), Some(years)) => EXPERIENCE_WEIGHT * (years / f64::from(min)).min(1.0),
            (Some(_), None) => 0.0,
        };

        let overall = required + preferred + experience;
        Ok(ScoreBlock::new(
            overall,
            quality_band(overall),
            json!({
                "required_skills_matched": required_matched,
                "required_skills_missing": required_missing,
                "bonus_skills": preferred_matched,
                "years_experience": years,
                "experience_score": experience,
            }),
        ))
    }
}

#[async_trait]
impl Summarizer for KeywordScorer {
    async fn summarize(
        &self,
        shortlist: &[RankedRecord],
        spec: &TargetSpec,
    ) -> Result<Value, SummaryError> {
        if shortlist.is_empty() {
            return Err(SummaryError("empty shortlist".to_string()));
        }
        let mean = shortlist.iter().map(RankedRecord::overall).sum::<f64>() / shortlist.len() as f64;
        let recommendations: Vec<Value> = shortlist
            .iter()
            .map(|r| {
                json!({
                    "name": r.record.name().unwrap_or("unnamed"),
                    "rank": r.rank,
                    "overall": r.overall(),
                    "quality": r.score.quality,
                })
            })
            .collect();

        Ok(json!({
            "summary": format!(
                "{} shortlisted for {}, mean score {:.1} ({})",
                shortlist.len(),
                spec.title,
                mean,
                quality_band(mean)
            ),
            "top_recommendations": recommendations,
        }))
    }
}

/// Scores every record 50 / "Unknown". Useful when no real judgment is
/// available but the pipeline should still run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralScorer;

impl NeutralScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scorer for NeutralScorer {
    fn name(&self) -> &str {
        "neutral"
    }

    async fn score(&self, _record: &Record, _spec: &TargetSpec) -> Result<ScoreBlock, ScoringError> {
        Ok(ScoreBlock::new(
            50.0,
            "Unknown",
            json!({ "reason": "no scoring judgment configured" }),
        ))
    }
}

#[async_trait]
impl Summarizer for NeutralScorer {
    async fn summarize(
        &self,
        shortlist: &[RankedRecord],
        _spec: &TargetSpec,
    ) -> Result<Value, SummaryError> {
        Ok(json!({
            "summary": format!("{} records shortlisted without a recommendation", shortlist.len()),
            "top_recommendations": [],
        }))
    }
}
