//! Record model: an open attribute map plus an origin tag.
//!
//! The core never interprets attributes (skills, experience, education,
//! contact fields, ...). It only reads `name` for log lines and owns the
//! `origin` tag, which is set once and never changed afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::errors::{CoreError, CoreResult};

/// Serialized key of the origin tag.
pub const ORIGIN_KEY: &str = "origin";

const UPLOADED_DOCUMENT_TAG: &str = "uploaded_document";

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Origin {
    /// Parsed from a document handed to the orchestrator.
    UploadedDocument,
    /// Returned by the named external source.
    Source(String),
}

impl Origin {
    /// Origin for a named source. Empty names and the reserved document tag
    /// are rejected: a record tagged with them could not be traced back.
    pub fn source(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::AggregationInconsistency(
                "source name is empty".to_string(),
            ));
        }
        if trimmed == UPLOADED_DOCUMENT_TAG {
            return Err(CoreError::AggregationInconsistency(format!(
                "source name '{trimmed}' is reserved"
            )));
        }
        Ok(Origin::Source(trimmed.to_string()))
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Origin::UploadedDocument => UPLOADED_DOCUMENT_TAG,
            Origin::Source(name) => name,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl TryFrom<String> for Origin {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == UPLOADED_DOCUMENT_TAG {
            Ok(Origin::UploadedDocument)
        } else {
            Origin::source(value)
        }
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.as_tag().to_string()
    }
}

/// One candidate data item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<Origin>,

    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a raw attribute map. A string `origin` entry is
    /// lifted into the origin tag; anything unparseable is left untagged so
    /// the aggregator stamps it from its stage.
    pub fn from_attributes(mut attributes: Map<String, Value>) -> Self {
        let origin = attributes
            .remove(ORIGIN_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .and_then(|tag| Origin::try_from(tag).ok());
        Self { origin, attributes }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Set an attribute. The origin key is owned by the core and ignored here.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if key == ORIGIN_KEY {
            tracing::warn!("ignoring attempt to set origin through attributes");
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// Tag the record with `origin` unless it already carries one. Returns
    /// the origin the record ends up with.
    pub(crate) fn stamp_origin(&mut self, origin: &Origin) -> &Origin {
        self.origin.get_or_insert_with(|| origin.clone())
    }
}
