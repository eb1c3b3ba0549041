//! Target specification: what records are scored against.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Matching criteria for one ranking pass. Held immutably (behind `&` or
/// `Arc`) for the whole pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_skills: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_years_experience: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_requirements: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,

    /// Open-ended constraints, passed through to the scorer untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub additional: Map<String, Value>,
}

impl TargetSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_required_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preferred_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_years_experience(mut self, years: u32) -> Self {
        self.min_years_experience = Some(years);
        self
    }
}
