use regex::Regex;
use tracing::warn;

use super::{compile_pattern, SegmenterConfig};
use crate::error::CorpusError;

/// Compiled start and end detectors for letter boundaries
#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    end: Regex,
    start_shapes: Vec<(String, Regex)>,
}

impl BoundaryDetector {
    /// Compile detectors from the configured place names and date shapes
    pub fn new(config: &SegmenterConfig) -> Result<Self, CorpusError> {
        // A blank entry would match every line
        let mut names: Vec<&str> = config
            .place_names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if names.len() < config.place_names.len() {
            warn!("Ignoring {} blank place names", config.place_names.len() - names.len());
        }
        if names.is_empty() {
            return Err(CorpusError::EmptyList("place names"));
        }

        let shapes: Vec<_> = config
            .date_shapes
            .iter()
            .filter(|shape| {
                let blank = shape.pattern.trim().is_empty();
                if blank {
                    warn!("Ignoring date shape {:?} with a blank pattern", shape.name);
                }
                !blank
            })
            .collect();
        if shapes.is_empty() {
            return Err(CorpusError::EmptyList("date shapes"));
        }

        // Longest names first so "Laurens C.H." wins over a shorter prefix
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        let alternatives = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        let end = compile_pattern("place_names", &format!(r"^.*?(?:{})[ \t]*$", alternatives))?;

        let start_shapes = shapes
            .into_iter()
            .map(|shape| {
                compile_pattern(&shape.name, &format!("^(?:{})", shape.pattern))
                    .map(|re| (shape.name.clone(), re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { end, start_shapes })
    }

    /// Whether the line closes a letter with a place-name sign-off
    pub fn is_end(&self, line: &str) -> bool {
        self.end.is_match(line.trim())
    }

    /// Whether the line opens a letter with a date heading
    pub fn is_start(&self, line: &str) -> bool {
        self.matching_shape(line).is_some()
    }

    /// Name of the first date shape the line matches
    pub fn matching_shape(&self, line: &str) -> Option<&str> {
        let line = line.trim();
        self.start_shapes
            .iter()
            .find(|(_, re)| re.is_match(line))
            .map(|(name, _)| name.as_str())
    }
}
