//! Aggregator - merge stage outputs into one record set.
//!
//! Stages are concatenated in the order the caller inserted them, so
//! tie-breaking downstream is reproducible. Every record leaves with an
//! origin: untagged records are stamped with their stage's origin, already
//! tagged records keep theirs. No de-duplication happens here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{CoreError, CoreResult, Origin, Record};

/// Stage outputs keyed by origin, in stage order.
pub type StageOutputs = IndexMap<Origin, Vec<Record>>;

/// Merged record set plus per-origin counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub records: Vec<Record>,
    /// Records per origin, in stage order. Stages that produced nothing
    /// still appear with a zero count.
    pub counts: IndexMap<Origin, usize>,
}

impl Aggregation {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn count_for(&self, origin: &Origin) -> usize {
        self.counts.get(origin).copied().unwrap_or(0)
    }
}

pub fn aggregate(stages: StageOutputs) -> Aggregation {
    let mut aggregation = Aggregation {
        records: Vec::with_capacity(stages.values().map(Vec::len).sum()),
        counts: stages.keys().map(|origin| (origin.clone(), 0)).collect(),
    };

    for (stage_origin, records) in stages {
        debug!(origin = %stage_origin, records = records.len(), "merging stage");
        for mut record in records {
            let origin = record.stamp_origin(&stage_origin).clone();
            if origin != stage_origin {
                warn!(
                    stage = %stage_origin,
                    record_origin = %origin,
                    "record already tagged with another origin; keeping its own"
                );
            }
            *aggregation.counts.entry(origin).or_insert(0) += 1;
            aggregation.records.push(record);
        }
    }

    aggregation
}

/// Take over a record set that was aggregated elsewhere. Order is kept as
/// given; every record must already carry an origin.
pub fn adopt_aggregated(records: Vec<Record>) -> CoreResult<Aggregation> {
    let mut counts = IndexMap::new();
    for (index, record) in records.iter().enumerate() {
        let origin = record.origin().ok_or_else(|| {
            CoreError::AggregationInconsistency(format!(
                "record {index} ({}) has no origin",
                record.name().unwrap_or("unnamed")
            ))
        })?;
        *counts.entry(origin.clone()).or_insert(0) += 1;
    }
    Ok(Aggregation { records, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Record {
        Record::new().with_attribute("name", name)
    }

    fn source(name: &str) -> Origin {
        Origin::source(name).unwrap()
    }

    #[test]
    fn concatenates_in_stage_order_and_stamps_origin() {
        let mut stages = StageOutputs::new();
        stages.insert(Origin::UploadedDocument, vec![named("doc-1")]);
        stages.insert(source("linkedin"), vec![named("li-1"), named("li-2")]);
        stages.insert(source("indeed"), vec![named("in-1")]);

        let agg = aggregate(stages);

        let names: Vec<_> = agg.records.iter().map(|r| r.name().unwrap()).collect();
        assert_eq!(names, vec!["doc-1", "li-1", "li-2", "in-1"]);
        assert_eq!(agg.records[0].origin(), Some(&Origin::UploadedDocument));
        assert_eq!(agg.records[2].origin(), Some(&source("linkedin")));
        assert!(agg.records.iter().all(|r| r.origin().is_some()));

        let counts: Vec<(String, usize)> = agg
            .counts
            .iter()
            .map(|(o, c)| (o.to_string(), *c))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("uploaded_document".to_string(), 1),
                ("linkedin".to_string(), 2),
                ("indeed".to_string(), 1)
            ]
        );
    }

    #[test]
    fn empty_stage_is_counted_as_zero() {
        let mut stages = StageOutputs::new();
        stages.insert(source("indeed"), vec![]);

        let agg = aggregate(stages);
        assert_eq!(agg.total(), 0);
        assert_eq!(agg.count_for(&source("indeed")), 0);
        assert!(agg.counts.contains_key(&source("indeed")));
    }

    #[test]
    fn existing_origin_is_kept() {
        let mut pre_tagged = named("x");
        pre_tagged.stamp_origin(&source("indeed"));

        let mut stages = StageOutputs::new();
        stages.insert(source("linkedin"), vec![pre_tagged]);

        let agg = aggregate(stages);
        assert_eq!(agg.records[0].origin(), Some(&source("indeed")));
        assert_eq!(agg.count_for(&source("indeed")), 1);
        assert_eq!(agg.count_for(&source("linkedin")), 0);
    }

    #[test]
    fn adopted_records_keep_order_and_are_counted() {
        let records: Vec<Record> = serde_json::from_value(serde_json::json!([
            {"name": "b", "origin": "indeed"},
            {"name": "a", "origin": "uploaded_document"},
            {"name": "c", "origin": "indeed"}
        ]))
        .unwrap();

        let agg = adopt_aggregated(records).unwrap();
        let names: Vec<_> = agg.records.iter().map(|r| r.name().unwrap()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(agg.count_for(&source("indeed")), 2);
        assert_eq!(agg.count_for(&Origin::UploadedDocument), 1);
    }

    #[test]
    fn adopting_an_untagged_record_is_an_inconsistency() {
        let mut tagged = named("tagged");
        tagged.stamp_origin(&source("indeed"));
        let records = vec![tagged, named("untagged")];
        let err = adopt_aggregated(records).unwrap_err();
        assert!(matches!(err, CoreError::AggregationInconsistency(msg) if msg.contains("record 1 (untagged)")));
    }

    #[test]
    fn identical_records_are_not_deduplicated() {
        let mut stages = StageOutputs::new();
        stages.insert(source("a"), vec![named("same")]);
        stages.insert(source("b"), vec![named("same")]);

        let agg = aggregate(stages);
        assert_eq!(agg.total(), 2);
        assert_ne!(agg.records[0].origin(), agg.records[1].origin());
    }
}
