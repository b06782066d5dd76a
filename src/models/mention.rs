use std::fmt;

use serde::{Deserialize, Serialize};

/// Column header shared by raw and clean mention tables
pub const MENTION_HEADER: [&str; 3] = ["letter_number", "entity_name", "entity_type"];

/// Kind of entity mentioned in a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Person,
    Location,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Location => "LOCATION",
        }
    }

    /// Parse a type cell, accepting the labels older extraction runs emitted
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => Some(Self::Person),
            "LOCATION" | "PLACE" | "GPE" | "LOC" => Some(Self::Location),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mention row as read, before any repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMention {
    /// Letter number cell as read (may be empty or non-numeric)
    pub letter_number: Option<String>,
    /// Entity name as read, possibly with quote or newline artifacts
    pub entity_name: String,
    /// Entity type cell, if present and recognised
    pub entity_type: Option<EntityType>,
    /// Number of fields the row carried
    pub field_count: usize,
    /// 1-based line in the source table
    pub source_line: usize,
}

impl RawMention {
    /// A fully populated row, as produced by the extraction stage
    pub fn new(letter_number: u32, entity_name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            letter_number: Some(letter_number.to_string()),
            entity_name: entity_name.into(),
            entity_type: Some(entity_type),
            field_count: 3,
            source_line: 0,
        }
    }

    /// Parse the letter number cell as a positive integer
    pub fn parsed_letter_number(&self) -> Option<u32> {
        self.letter_number.as_deref().and_then(parse_letter_number)
    }
}

/// Parse a letter number cell; only positive integers are valid
pub fn parse_letter_number(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u32>().ok().filter(|&n| n > 0)
}

/// A repaired, validated mention row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// None only for rows with no earlier valid number to carry forward
    pub letter_number: Option<u32>,
    pub entity_name: String,
    pub entity_type: EntityType,
}

impl Mention {
    /// Key used for duplicate detection
    pub fn dedup_key(&self) -> (Option<u32>, String, EntityType) {
        (
            self.letter_number,
            self.entity_name.to_lowercase(),
            self.entity_type,
        )
    }
}

/// Why a clean row needs manual review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// No valid letter number before this row to carry forward
    UnknownLetter,
    /// The row points at a letter number that does not exist
    OrphanedLetter,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLetter => f.write_str("no letter number to carry forward"),
            Self::OrphanedLetter => f.write_str("letter number has no matching letter"),
        }
    }
}

/// A report item for manual review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionWarning {
    pub source_line: usize,
    pub letter_number: Option<u32>,
    pub entity_name: String,
    pub reason: WarningReason,
}

impl fmt::Display for MentionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {:?} ({})",
            self.source_line, self.entity_name, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_letter_number() {
        assert_eq!(parse_letter_number("12"), Some(12));
        assert_eq!(parse_letter_number(" 7 "), Some(7));
        assert_eq!(parse_letter_number(""), None);
        assert_eq!(parse_letter_number("0"), None);
        assert_eq!(parse_letter_number("-3"), None);
        assert_eq!(parse_letter_number("Mill Town"), None);
    }

    #[test]
    fn test_entity_type_aliases() {
        assert_eq!(EntityType::parse("PERSON"), Some(EntityType::Person));
        assert_eq!(EntityType::parse("Place"), Some(EntityType::Location));
        assert_eq!(EntityType::parse("gpe"), Some(EntityType::Location));
        assert_eq!(EntityType::parse("ORG"), None);
    }

    #[test]
    fn test_dedup_key_ignores_case() {
        let a = Mention {
            letter_number: Some(3),
            entity_name: "B. F. Perry".to_string(),
            entity_type: EntityType::Person,
        };
        let b = Mention {
            entity_name: "b. f. perry".to_string(),
            ..a.clone()
        };
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
