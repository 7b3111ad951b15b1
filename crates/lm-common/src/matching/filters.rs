//! Attribute filters: wage range, minimum rating, substring match.
//!
//! Filters never fail. Anything that does not parse as a finite number is
//! treated as "not set".

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Candidate, MatchProfile};

/// Filters as they arrive from a form or query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFilters {
    #[serde(default, deserialize_with = "lenient_string")]
    pub min_wage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub max_wage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub min_rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
}

// Accepts `"700"`, `700`, `null` or anything else (kept as its JSON text).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub min_wage: Option<f64>,
    pub max_wage: Option<f64>,
    pub min_rating: Option<f64>,
    /// Case-insensitive substring over location and skills.
    pub text: Option<String>,
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn normalize_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

impl SearchFilters {
    pub fn from_raw(raw: &RawFilters) -> Self {
        Self {
            min_wage: parse_number(raw.min_wage.as_deref()),
            max_wage: parse_number(raw.max_wage.as_deref()),
            min_rating: parse_number(raw.min_rating.as_deref()),
            text: normalize_text(raw.text.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_wage.is_none()
            && self.max_wage.is_none()
            && self.min_rating.is_none()
            && self.text_needle().is_none()
    }

    /// Copy of these filters whose substring needle is `text` unless one is
    /// already set.
    pub fn with_default_text(&self, text: Option<&str>) -> Self {
        let mut filters = self.clone();
        if filters.text_needle().is_none() {
            filters.text = normalize_text(text);
        }
        filters
    }

    fn text_needle(&self) -> Option<String> {
        normalize_text(self.text.as_deref())
    }

    /// Wage and rating checks only.
    pub fn matches_numeric(&self, candidate: &dyn MatchProfile) -> bool {
        let wage = candidate.wage();

        if let Some(min) = self.min_wage {
            if !wage.is_some_and(|w| w >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_wage {
            if !wage.is_some_and(|w| w <= max) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if candidate.rating() < min {
                return false;
            }
        }
        true
    }

    pub fn matches_text(&self, candidate: &dyn MatchProfile) -> bool {
        let Some(needle) = self.text_needle() else {
            return true;
        };

        let haystack = format!(
            "{} {}",
            candidate.location().unwrap_or_default(),
            candidate.skills().join(" ")
        )
        .to_lowercase();

        haystack.contains(&needle)
    }

    pub fn matches(&self, candidate: &dyn MatchProfile) -> bool {
        self.matches_numeric(candidate) && self.matches_text(candidate)
    }

    /// Candidates passing every set filter, in input order.
    pub fn apply<'a>(&self, candidates: &'a [Candidate]) -> Vec<&'a Candidate> {
        candidates.iter().filter(|c| self.matches(*c)).collect()
    }
}
