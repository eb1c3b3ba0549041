//! Local document handling: plain-text extraction and `Key: value` parsing.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{ExtractError, ORIGIN_KEY, Record};
use crate::ports::{RecordParser, TextExtractor};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// Attributes whose value is a comma separated list.
const LIST_KEYS: &[&str] = &["skills", "languages", "certifications"];

/// Reads UTF-8 text files. Binary formats are reported as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ExtractError::UnsupportedFormat(format!(".{extension}")));
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        if text.trim().is_empty() {
            return Err(ExtractError::Extraction(format!(
                "no text in {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), bytes = text.len(), "text extracted");
        Ok(text)
    }
}

/// Turns `Key: value` lines into attributes.
///
/// Keys are lower-cased with spaces replaced by `_`. An unkeyed line before
/// the first keyed one is taken as the `name`. Integer values become
/// numbers; list keys (`skills`, ...) are split on commas.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldRecordParser;

impl FieldRecordParser {
    pub fn new() -> Self {
        Self
    }

    fn value_for(key: &str, raw: &str) -> Value {
        if LIST_KEYS.contains(&key) {
            return Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            );
        }
        match raw.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(raw.to_string()),
        }
    }
}

#[async_trait]
impl RecordParser for FieldRecordParser {
    async fn parse(&self, text: &str) -> Result<Record, ExtractError> {
        let mut attributes = Map::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once(':') {
                Some((key, value)) if !key.trim().is_empty() => {
                    let key = key.trim().to_lowercase().replace(' ', "_");
                    let value = value.trim();
                    // origin is assigned by the aggregator, never by the document
                    if value.is_empty() || key == ORIGIN_KEY {
                        continue;
                    }
                    attributes.insert(key.clone(), Self::value_for(&key, value));
                }
                _ if attributes.is_empty() => {
                    attributes.insert("name".to_string(), Value::String(line.to_string()));
                }
                _ => {}
            }
        }

        if attributes.is_empty() {
            return Err(ExtractError::Extraction(
                "no fields found in document".to_string(),
            ));
        }
        Ok(Record::from_attributes(attributes))
    }
}
