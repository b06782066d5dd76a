use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::heuristics::{MetadataConfig, NormalizerConfig, SegmenterConfig};

/// Corpus-specific word lists and patterns, loaded from TOML
///
/// Every section is optional; a missing section keeps the built-in defaults.
///
/// ```toml
/// [segmenter]
/// place_names = ["Greenville", "Columbia"]
///
/// [[segmenter.date_shapes]]
/// name = "weekday"
/// pattern = "(?:Monday|Tuesday)"
///
/// [normalizer]
/// junk_words = ["mutton", "Breakfast"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusProfile {
    pub segmenter: SegmenterConfig,
    pub normalizer: NormalizerConfig,
    pub metadata: MetadataConfig,
}

impl CorpusProfile {
    /// Load a profile from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, CorpusError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|source| CorpusError::ProfileRead {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content).map_err(|message| CorpusError::ProfileParse { path, message })
    }

    /// Parse a profile from TOML text
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load from `path` when given, else use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, CorpusError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_profile_keeps_defaults() {
        let profile = CorpusProfile::from_toml(
            r#"
            [normalizer]
            junk_words = ["Piazza"]
            "#,
        )
        .unwrap();

        assert_eq!(profile.normalizer.junk_words, vec!["Piazza".to_string()]);
        assert_eq!(profile.segmenter, SegmenterConfig::default());
        assert_eq!(profile.metadata.date_search_lines, 5);
    }

    #[test]
    fn test_date_shapes_from_toml() {
        let profile = CorpusProfile::from_toml(
            r#"
            [segmenter]
            place_names = ["Sans Souci"]

            [[segmenter.date_shapes]]
            name = "weekday"
            pattern = "(?:Monday|Friday)"
            "#,
        )
        .unwrap();

        assert_eq!(profile.segmenter.place_names, vec!["Sans Souci".to_string()]);
        assert_eq!(profile.segmenter.date_shapes.len(), 1);
        assert_eq!(profile.segmenter.date_shapes[0].name, "weekday");
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            CorpusProfile::from_file(&missing),
            Err(CorpusError::ProfileRead { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[segmenter\nplace_names = 3").unwrap();
        assert!(matches!(
            CorpusProfile::from_file(&bad),
            Err(CorpusError::ProfileParse { .. })
        ));
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(CorpusProfile::load(None).unwrap(), CorpusProfile::default());
    }
}
