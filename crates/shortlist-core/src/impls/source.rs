//! Local sources: a fixed record list and an always-down stand-in.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Record, SourceError};
use crate::ports::{SearchRequest, SourceQuery};

/// Serves a fixed set of records, filtered by the request's title and
/// keywords (case-insensitive substring match on string attributes).
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    fn matches(record: &Record, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let haystack = searchable_text(record);
        terms.iter().any(|term| haystack.contains(term.as_str()))
    }
}

fn searchable_text(record: &Record) -> String {
    let mut text = String::new();
    for value in record.attributes().values() {
        match value {
            Value::String(s) => {
                text.push_str(&s.to_lowercase());
                text.push('\n');
            }
            Value::Array(items) => {
                for s in items.iter().filter_map(Value::as_str) {
                    text.push_str(&s.to_lowercase());
                    text.push('\n');
                }
            }
            _ => {}
        }
    }
    text
}

#[async_trait]
impl SourceQuery for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Record>, SourceError> {
        let terms: Vec<String> = std::iter::once(&request.title)
            .chain(&request.keywords)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let limit = request.limit.unwrap_or(usize::MAX);
        let hits: Vec<Record> = self
            .records
            .iter()
            .filter(|r| Self::matches(r, &terms))
            .take(limit)
            .cloned()
            .collect();

        debug!(source = %self.name, hits = hits.len(), "static source searched");
        Ok(hits)
    }
}

/// A source that is always unavailable.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    name: String,
    message: String,
}

impl UnavailableSource {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl SourceQuery for UnavailableSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Record>, SourceError> {
        Err(SourceError::Unavailable {
            source_name: self.name.clone(),
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> StaticSource {
        let records = serde_json::from_value(json!([
            {"name": "Ada", "title": "Senior Rust Engineer", "skills": ["Rust", "Tokio"]},
            {"name": "Bob", "title": "Data Analyst", "skills": ["SQL"]},
            {"name": "Cy", "title": "Platform Engineer", "skills": ["rust"]}
        ]))
        .unwrap();
        StaticSource::new("linkedin", records)
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.name().unwrap()).collect()
    }

    #[tokio::test]
    async fn filters_by_title_or_keyword() {
        let hits = source().search(&SearchRequest::new("rust")).await.unwrap();
        assert_eq!(names(&hits), vec!["Ada", "Cy"]);

        let mut request = SearchRequest::new("analyst");
        request.keywords = vec!["tokio".to_string()];
        let hits = source().search(&request).await.unwrap();
        assert_eq!(names(&hits), vec!["Ada", "Bob"]);
    }

    #[tokio::test]
    async fn empty_query_returns_everything_up_to_limit() {
        let mut request = SearchRequest::new("");
        request.limit = Some(2);
        let hits = source().search(&request).await.unwrap();
        assert_eq!(names(&hits), vec!["Ada", "Bob"]);
    }

    #[tokio::test]
    async fn unavailable_source_fails() {
        let err = UnavailableSource::new("indeed", "503")
            .search(&SearchRequest::new("rust"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SourceError::Unavailable {
                source_name: "indeed".into(),
                message: "503".into()
            }
        );
    }
}
