use tracing::{debug, info, warn};

use crate::llm::{EntityExtractor, ExtractedEntities};
use crate::models::{EntityType, Letter, RawMention};

/// Configuration for Stage 1
#[derive(Debug, Clone)]
pub struct Stage1Config {
    /// Extra attempts per letter after a failed call
    pub max_retries: u32,
    /// Skip letters with no text instead of sending them
    pub skip_blank_letters: bool,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self {
            max_retries: 2,
            skip_blank_letters: true,
        }
    }
}

/// Result of Stage 1 extraction
#[derive(Debug, Default)]
pub struct Stage1Result {
    /// Raw mention rows, in letter order
    pub rows: Vec<RawMention>,
    /// Letters the extractor answered for
    pub letters_processed: usize,
    /// Letters skipped because they had no text
    pub letters_skipped: usize,
    /// Letters whose extraction failed after all retries
    pub failures: Vec<u32>,
}

/// Execute Stage 1: entity extraction
///
/// Letters are sent one at a time. A letter that keeps failing is logged
/// and left out; the rest of the batch still runs.
pub async fn execute_stage1(
    extractor: &dyn EntityExtractor,
    letters: &[Letter],
    config: &Stage1Config,
) -> Stage1Result {
    let mut result = Stage1Result::default();

    info!("Stage 1: Extracting entities from {} letters", letters.len());

    for letter in letters {
        if config.skip_blank_letters && letter.text.trim().is_empty() {
            debug!("Letter {}: no text, skipped", letter.number);
            result.letters_skipped += 1;
            continue;
        }

        match extract_with_retries(extractor, letter, config.max_retries).await {
            Ok(entities) => {
                debug!(
                    "Letter {}: {} persons, {} places",
                    letter.number,
                    entities.persons.len(),
                    entities.places.len()
                );
                result.rows.extend(mention_rows(letter.number, entities));
                result.letters_processed += 1;
            }
            Err(e) => {
                warn!("Letter {}: extraction failed: {:#}", letter.number, e);
                result.failures.push(letter.number);
            }
        }
    }

    info!(
        "Stage 1 complete: {} rows from {} letters ({} failed, {} skipped)",
        result.rows.len(),
        result.letters_processed,
        result.failures.len(),
        result.letters_skipped
    );

    result
}

async fn extract_with_retries(
    extractor: &dyn EntityExtractor,
    letter: &Letter,
    max_retries: u32,
) -> anyhow::Result<ExtractedEntities> {
    let mut attempt = 0;
    loop {
        match extractor.extract(letter.number, &letter.text).await {
            Ok(entities) => return Ok(entities),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                warn!(
                    "Letter {}: attempt {} failed ({}), retrying",
                    letter.number, attempt, e
                );
            }
            Err(e) => return Err(e),
        }
    }
}

fn mention_rows(letter_number: u32, entities: ExtractedEntities) -> impl Iterator<Item = RawMention> {
    let persons = entities
        .persons
        .into_iter()
        .map(move |name| RawMention::new(letter_number, name, EntityType::Person));
    let places = entities
        .places
        .into_iter()
        .map(move |name| RawMention::new(letter_number, name, EntityType::Location));
    persons.chain(places)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::llm::StaticExtractor;

    fn letter(number: u32, text: &str) -> Letter {
        Letter {
            number,
            text: text.to_string(),
            first_line: 0,
            line_count: 1,
        }
    }

    #[tokio::test]
    async fn test_rows_follow_letter_order() {
        let extractor = StaticExtractor::new()
            .with(1, &["Liz"], &["Greenville"])
            .with(2, &["B. F. Perry", "Hext"], &[]);
        let letters = vec![letter(1, "Dear Liz"), letter(2, "Dear Hext")];

        let result = execute_stage1(&extractor, &letters, &Stage1Config::default()).await;

        assert_eq!(result.letters_processed, 2);
        assert!(result.failures.is_empty());
        assert_eq!(
            result.rows,
            vec![
                RawMention::new(1, "Liz", EntityType::Person),
                RawMention::new(1, "Greenville", EntityType::Location),
                RawMention::new(2, "B. F. Perry", EntityType::Person),
                RawMention::new(2, "Hext", EntityType::Person),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_letter_does_not_stop_batch() {
        let extractor = StaticExtractor::new().with(2, &[], &["Columbia"]);
        let letters = vec![letter(1, "lost"), letter(2, "Columbia")];

        let result = execute_stage1(&extractor, &letters, &Stage1Config::default()).await;

        assert_eq!(result.failures, vec![1]);
        assert_eq!(result.letters_processed, 1);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].entity_type, Some(EntityType::Location));
    }

    #[tokio::test]
    async fn test_blank_letters_are_skipped() {
        let extractor = StaticExtractor::new();
        let letters = vec![letter(1, "  \n")];

        let result = execute_stage1(&extractor, &letters, &Stage1Config::default()).await;

        assert_eq!(result.letters_skipped, 1);
        assert!(result.failures.is_empty());
    }

    struct FlakyExtractor {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl EntityExtractor for FlakyExtractor {
        async fn extract(&self, _letter_number: u32, _text: &str) -> anyhow::Result<ExtractedEntities> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                anyhow::bail!("overloaded");
            }
            Ok(ExtractedEntities {
                persons: vec!["Liz".to_string()],
                places: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let extractor = FlakyExtractor {
            calls: AtomicU32::new(0),
            fail_first: 2,
        };
        let letters = vec![letter(1, "Dear Liz")];

        let result = execute_stage1(&extractor, &letters, &Stage1Config::default()).await;

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.letters_processed, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let extractor = FlakyExtractor {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        };
        let config = Stage1Config {
            max_retries: 1,
            ..Default::default()
        };

        let result = execute_stage1(&extractor, &[letter(7, "x")], &config).await;

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.failures, vec![7]);
    }
}
