use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use crate::error::CorpusError;
use crate::heuristics::{compile_pattern, MetadataConfig};
use crate::models::{Letter, LetterMetadata};

/// Recovers date, sign-off and signature fields from letter bodies
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    date: Regex,
    signatures: Vec<Regex>,
    date_search_lines: usize,
    signature_search_lines: usize,
}

impl MetadataExtractor {
    pub fn new(config: &MetadataConfig) -> Result<Self, CorpusError> {
        let date = compile_pattern("date_pattern", &config.date_pattern)?;
        let signatures = config
            .signature_patterns
            .iter()
            .map(|p| compile_pattern("signature_patterns", p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            date,
            signatures,
            date_search_lines: config.date_search_lines,
            signature_search_lines: config.signature_search_lines,
        })
    }

    /// Extract metadata for one letter stored under `filename`
    pub fn extract(&self, letter: &Letter, filename: &str) -> LetterMetadata {
        let lines: Vec<&str> = letter.content_lines().collect();

        let mut meta = LetterMetadata {
            letter_number: letter.number,
            filename: filename.to_string(),
            ..Default::default()
        };

        if let Some(found) = lines
            .iter()
            .take(self.date_search_lines)
            .find_map(|l| self.date.find(l))
        {
            meta.date = found.as_str().to_string();
            if let Some(date) = parse_heading_date(&meta.date) {
                meta.set_date(date);
            }
        }

        meta.sent_from = lines.last().map(|l| l.to_string()).unwrap_or_default();
        if lines.len() > 1 {
            meta.recipient = lines[lines.len() - 2].to_string();
        }

        let tail_start = lines.len().saturating_sub(self.signature_search_lines);
        meta.sender = lines[tail_start..]
            .iter()
            .find_map(|l| {
                // Leftmost match wins; ties keep pattern order
                self.signatures
                    .iter()
                    .filter_map(|re| re.find(l))
                    .min_by_key(|m| m.start())
            })
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        meta
    }
}

/// Parse "3 May 1859", "30 November [1837]" or "1 Jan. 1860"
pub fn parse_heading_date(text: &str) -> Option<NaiveDate> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '.'))
        .collect();
    NaiveDate::parse_from_str(cleaned.trim(), "%d %B %Y").ok()
}

/// Extract metadata for every letter, naming files `<prefix>_Letter{N}.txt`
pub fn execute_metadata(
    letters: &[Letter],
    extractor: &MetadataExtractor,
    prefix: &str,
) -> Vec<LetterMetadata> {
    let metadata: Vec<LetterMetadata> = letters
        .iter()
        .map(|letter| {
            let filename = crate::io::letter_filename(prefix, letter.number);
            let meta = extractor.extract(letter, &filename);
            debug!(
                "Letter {}: date {:?}, from {:?}",
                letter.number, meta.date, meta.sent_from
            );
            meta
        })
        .collect();

    let dated = metadata.iter().filter(|m| m.year.is_some()).count();
    info!(
        "Extracted metadata for {} letters ({} with a parsed date)",
        metadata.len(),
        dated
    );
    metadata
}
