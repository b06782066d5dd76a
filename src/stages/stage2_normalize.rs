use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::heuristics::{normalize_entity_name, strip_quotes, JunkFilter, NormalizerConfig};
use crate::models::{EntityType, Mention, MentionWarning, RawMention, WarningReason};

/// Repairs raw mention tables into loadable rows
#[derive(Debug, Clone)]
pub struct TableNormalizer {
    junk: JunkFilter,
}

impl TableNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            junk: JunkFilter::new(config),
        }
    }
}

impl Default for TableNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

/// A clean mention with the source line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub mention: Mention,
    pub source_line: usize,
}

/// Counters describing what the repair pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub rows_read: usize,
    /// Extra rows produced by splitting multi-line names
    pub rows_split: usize,
    pub carried_forward: usize,
    pub retyped_as_location: usize,
    pub type_inferred: usize,
    pub duplicates_removed: usize,
    pub junk_removed: usize,
}

/// Result of Stage 2 normalization
#[derive(Debug)]
pub struct Stage2Result {
    pub rows: Vec<NormalizedRow>,
    /// Rows kept with an empty letter number
    pub warnings: Vec<MentionWarning>,
    pub report: NormalizationReport,
}

impl Stage2Result {
    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.rows.iter().map(|r| &r.mention)
    }
}

/// A row after type inference and letter-number fill-forward
#[derive(Debug)]
struct RepairedRow {
    letter_number: Option<u32>,
    entity_name: String,
    entity_type: EntityType,
    type_inferred: bool,
    carried_forward: bool,
    retyped: bool,
    source_line: usize,
}

/// Execute Stage 2: repair a raw mention table
///
/// Rules, in order:
/// 1. Strip quote characters; split multi-line names into continuation rows
/// 2. Default a missing type to PERSON
/// 3. Carry the last valid letter number forward onto rows without one
/// 4. Retype PERSON rows without their own letter number as LOCATION
/// 5. Drop duplicate (letter, name, type) rows, name compared case-insensitively
/// 6. Normalize name spacing, initials and edge punctuation
/// 7. Drop junk names
pub fn execute_stage2(rows: &[RawMention], normalizer: &TableNormalizer) -> Stage2Result {
    let mut report = NormalizationReport {
        rows_read: rows.len(),
        ..Default::default()
    };

    let expanded = split_multi_value_rows(rows);
    report.rows_split = expanded.len() - rows.len();

    let repaired: Vec<RepairedRow> = expanded
        .into_iter()
        .scan(None, |last_good: &mut Option<u32>, row| {
            Some(repair_row(row, last_good))
        })
        .collect();

    let mut seen = HashSet::new();
    let mut clean = Vec::with_capacity(repaired.len());
    let mut warnings = Vec::new();

    for row in repaired {
        let name = normalize_entity_name(&row.entity_name);
        if normalizer.junk.is_junk(&name) {
            debug!("Dropping junk name {:?} (line {})", row.entity_name, row.source_line);
            report.junk_removed += 1;
            continue;
        }

        let mention = Mention {
            letter_number: row.letter_number,
            entity_name: name,
            entity_type: row.entity_type,
        };
        if !seen.insert(mention.dedup_key()) {
            report.duplicates_removed += 1;
            continue;
        }

        report.type_inferred += usize::from(row.type_inferred);
        report.carried_forward += usize::from(row.carried_forward);
        report.retyped_as_location += usize::from(row.retyped);

        if mention.letter_number.is_none() {
            warn!(
                "Line {}: {:?} has no letter number to carry forward",
                row.source_line, mention.entity_name
            );
            warnings.push(MentionWarning {
                source_line: row.source_line,
                letter_number: None,
                entity_name: mention.entity_name.clone(),
                reason: WarningReason::UnknownLetter,
            });
        }

        clean.push(NormalizedRow {
            mention,
            source_line: row.source_line,
        });
    }

    info!(
        "Normalized {} rows into {} ({} carried forward, {} retyped, {} duplicates, {} junk)",
        report.rows_read,
        clean.len(),
        report.carried_forward,
        report.retyped_as_location,
        report.duplicates_removed,
        report.junk_removed
    );

    Stage2Result {
        rows: clean,
        warnings,
        report,
    }
}

/// Rule 1: quotes are upstream artifacts; each extra name line is a
/// continuation row belonging to the same letter
fn split_multi_value_rows(rows: &[RawMention]) -> Vec<RawMention> {
    let mut expanded = Vec::with_capacity(rows.len());

    for row in rows {
        let name = strip_quotes(&row.entity_name);
        let mut parts = name.split(['\n', '\r']);
        let first = parts.next().unwrap_or_default();

        expanded.push(RawMention {
            entity_name: first.to_string(),
            ..row.clone()
        });

        for part in parts.filter(|p| !p.trim().is_empty()) {
            expanded.push(RawMention {
                letter_number: None,
                entity_name: part.to_string(),
                entity_type: None,
                field_count: 1,
                source_line: row.source_line,
            });
        }
    }

    expanded
}

/// Rules 2 to 4, threading the last valid letter number through the rows
fn repair_row(row: RawMention, last_good: &mut Option<u32>) -> RepairedRow {
    let (entity_type, type_inferred) = match row.entity_type {
        Some(t) => (t, false),
        None => (EntityType::Person, true),
    };

    match row.parsed_letter_number() {
        Some(number) => {
            *last_good = Some(number);
            RepairedRow {
                letter_number: Some(number),
                entity_name: row.entity_name,
                entity_type,
                type_inferred,
                carried_forward: false,
                retyped: false,
                source_line: row.source_line,
            }
        }
        None => {
            let retyped = entity_type == EntityType::Person;
            RepairedRow {
                letter_number: *last_good,
                entity_name: row.entity_name,
                entity_type: if retyped {
                    EntityType::Location
                } else {
                    entity_type
                },
                type_inferred,
                carried_forward: last_good.is_some(),
                retyped,
                source_line: row.source_line,
            }
        }
    }
}

/// Flag clean rows whose letter number matches no known letter
pub fn find_orphans(rows: &[NormalizedRow], known_letters: &BTreeSet<u32>) -> Vec<MentionWarning> {
    rows.iter()
        .filter_map(|row| {
            let number = row.mention.letter_number?;
            (!known_letters.contains(&number)).then(|| MentionWarning {
                source_line: row.source_line,
                letter_number: Some(number),
                entity_name: row.mention.entity_name.clone(),
                reason: WarningReason::OrphanedLetter,
            })
        })
        .collect()
}
