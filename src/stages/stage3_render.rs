use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CorpusError;
use crate::io::{
    write_letter_dir, write_letters_file, write_mentions_csv, write_metadata_csv,
    write_warnings_csv,
};
use crate::models::{Letter, LetterMetadata};

use super::Stage2Result;

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct Stage3Config {
    /// Whether to write the combined letters file
    pub write_combined: bool,
    /// Whether to write one file per letter
    pub write_per_letter: bool,
    /// File name prefix for per-letter files
    pub file_prefix: String,
}

impl Default for Stage3Config {
    fn default() -> Self {
        Self {
            write_combined: true,
            write_per_letter: true,
            file_prefix: "BFPerry".to_string(),
        }
    }
}

/// Where each output goes; `None` skips that output
#[derive(Debug, Clone, Default)]
pub struct RenderTargets {
    pub combined: Option<PathBuf>,
    pub letter_dir: Option<PathBuf>,
    pub mentions: Option<PathBuf>,
    pub warnings: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
}

/// What Stage 3 wrote
#[derive(Debug, Default)]
pub struct Stage3Result {
    pub combined_path: Option<PathBuf>,
    pub letter_paths: Vec<PathBuf>,
    pub mentions_path: Option<PathBuf>,
    pub warnings_path: Option<PathBuf>,
    pub metadata_path: Option<PathBuf>,
}

/// Execute Stage 3: Rendering
///
/// Any write failure stops rendering and is returned with the path that
/// failed.
pub fn execute_stage3(
    letters: &[Letter],
    table: Option<&Stage2Result>,
    metadata: &[LetterMetadata],
    targets: &RenderTargets,
    config: &Stage3Config,
) -> Result<Stage3Result, CorpusError> {
    let mut result = Stage3Result::default();

    if config.write_combined {
        if let Some(path) = targets.combined.as_deref() {
            info!("Writing {} letters to {:?}", letters.len(), path);
            write_letters_file(path, letters)?;
            result.combined_path = Some(path.to_path_buf());
        }
    }

    if config.write_per_letter {
        if let Some(dir) = targets.letter_dir.as_deref() {
            info!("Writing {} letter files to {:?}", letters.len(), dir);
            result.letter_paths = write_letter_dir(dir, &config.file_prefix, letters)?;
        }
    }

    if let Some(table) = table {
        result.mentions_path = write_if(targets.mentions.as_deref(), |path| {
            info!("Writing {} clean rows to {:?}", table.rows.len(), path);
            write_mentions_csv(path, &table.rows)
        })?;
        result.warnings_path = write_if(targets.warnings.as_deref(), |path| {
            info!("Writing {} warnings to {:?}", table.warnings.len(), path);
            write_warnings_csv(path, &table.warnings)
        })?;
    }

    if !metadata.is_empty() {
        result.metadata_path = write_if(targets.metadata.as_deref(), |path| {
            info!("Writing metadata for {} letters to {:?}", metadata.len(), path);
            write_metadata_csv(path, metadata)
        })?;
    }

    Ok(result)
}

fn write_if(
    path: Option<&Path>,
    write: impl FnOnce(&Path) -> Result<(), CorpusError>,
) -> Result<Option<PathBuf>, CorpusError> {
    match path {
        Some(path) => {
            write(path)?;
            Ok(Some(path.to_path_buf()))
        }
        None => Ok(None),
    }
}
