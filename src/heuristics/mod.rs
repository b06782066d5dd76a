pub mod boundaries;
pub mod cleanup;
pub mod names;

pub use boundaries::*;
pub use cleanup::*;
pub use names::*;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// Compile a configured pattern case-insensitively, naming it in the error
pub(crate) fn compile_pattern(name: &str, pattern: &str) -> Result<Regex, CorpusError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| CorpusError::InvalidPattern {
            name: name.to_string(),
            source,
        })
}

/// A named regex fragment accepted as the start of a date heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateShape {
    pub name: String,
    pub pattern: String,
}

impl DateShape {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// Corpus-specific vocabulary for letter boundary detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Place names that close a letter when they end a line
    pub place_names: Vec<String>,
    /// Accepted shapes for the date heading that opens a letter
    pub date_shapes: Vec<DateShape>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            place_names: [
                "Greenville",
                "Columbia",
                "Laurens C.H.",
                "Anderson",
                "Spartanburgh C.H.",
                "Water Loo P.O.",
                "Kinder Hook",
                "Boston",
                "Albany",
                "New Haven",
                "Philadelphia",
                "Washington",
                "Charleston",
                "Pickens C.H.",
                "Sans Souci",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            date_shapes: vec![
                DateShape::new(
                    "weekday",
                    r"(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)",
                ),
                DateShape::new("day_month_year", r"[0-9]{1,2} [A-Za-z]+ [0-9]{4}"),
                DateShape::new(
                    "weekday_day_month_year",
                    r"[A-Za-z]+, [0-9]{1,2} [A-Za-z]+ [0-9]{4}",
                ),
                DateShape::new(
                    "bracketed_year",
                    r"\[?[0-9]{1,2} [A-Za-z]+ \[[0-9]{4}\]",
                ),
                DateShape::new("day_month", r"[0-9]{1,2} [A-Za-z]+"),
                DateShape::new("month_year", r"[A-Za-z]+ [0-9]{4}"),
                DateShape::new("month_comma_year", r"[A-Za-z]+, [0-9]{4}"),
                DateShape::new("year", r"[0-9]{4}"),
            ],
        }
    }
}

/// Corpus-specific vocabulary for mention table repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Extracted tokens known to be wrongly tagged as entities
    pub junk_words: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            junk_words: [
                "Bananas",
                "Breakfast",
                "Lunch",
                "Dinner",
                "Gallery",
                "Grammar",
                "China",
                "America",
                "Equity",
                "Farms",
                "Fields",
                "Library",
                "Painting",
                "Resolutions",
                "States",
                "Town",
                "Home",
                "Ladies",
                "Parlor",
                "Schoolcraft",
                "Sugar",
                "Truly",
                "Wellborn Perry",
                "beaux",
                "drank",
                "inkstand ivory",
                "ivory match box",
                "parlor ball",
                "strawberry pies",
                "mutton",
                "turkey",
                "well.",
                "ytoung",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Patterns used to recover per-letter metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Regex locating the date heading within a line
    pub date_pattern: String,
    /// How many leading non-empty lines to search for the date
    pub date_search_lines: usize,
    /// Regexes recognising the writer's signature
    pub signature_patterns: Vec<String>,
    /// How many trailing non-empty lines to search for a signature
    pub signature_search_lines: usize,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            date_pattern: r"[0-9]{1,2} [A-Za-z]+\.? \[?[0-9]{4}\]?".to_string(),
            date_search_lines: 5,
            signature_patterns: vec![
                r"B\.\s?F\. Perry".to_string(),
                r"Benjamin Franklin Perry".to_string(),
                r"Yours.*".to_string(),
            ],
            signature_search_lines: 10,
        }
    }
}
