use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::NormalizerConfig;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A capital letter followed by a space, period, comma or the end of the name
static INITIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]([\s.,]|$)").expect("valid regex"));

static REPEATED_PERIODS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2,}").expect("valid regex"));

static SPACE_BEFORE_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\.").expect("valid regex"));

static SPACE_AFTER_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s+").expect("valid regex"));

const EDGE_PUNCTUATION: &[char] = &[' ', ',', ';', ':', '.'];

/// Remove quote characters left over from multi-value cells
pub fn strip_quotes(name: &str) -> String {
    name.replace('"', "")
}

/// Normalize an extracted entity name
///
/// `"B  F Perry,"` becomes `"B. F. Perry"`.
pub fn normalize_entity_name(name: &str) -> String {
    let name = WHITESPACE.replace_all(name.trim(), " ");
    let name = mark_initials(&name);
    let name = REPEATED_PERIODS.replace_all(&name, ".");
    let name = SPACE_BEFORE_PERIOD.replace_all(&name, ".");
    let name = SPACE_AFTER_PERIOD.replace_all(&name, ". ");
    name.trim_matches(EDGE_PUNCTUATION).to_string()
}

/// Put a period after each isolated capital
///
/// The capital must also follow the start of the name, a space or a period,
/// so "O'Neall" and "McA" are left alone.
fn mark_initials(name: &str) -> Cow<'_, str> {
    INITIAL.replace_all(name, |caps: &Captures| {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        let isolated = name[..start]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace() || c == '.');
        if isolated {
            format!("{}.{}", &whole[..1], &caps[1])
        } else {
            whole.to_string()
        }
    })
}

/// Rejects names that are too short, letterless, or known-bad
#[derive(Debug, Clone, Default)]
pub struct JunkFilter {
    words: HashSet<String>,
}

impl JunkFilter {
    pub fn new(config: &NormalizerConfig) -> Self {
        let words = config
            .junk_words
            .iter()
            .map(|w| normalize_entity_name(w).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Whether the exclusion list holds this name (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.words.contains(&name.to_lowercase())
    }

    /// Whether a normalized name should be discarded
    pub fn is_junk(&self, name: &str) -> bool {
        name.chars().count() <= 2 || !name.chars().any(char::is_alphabetic) || self.contains(name)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
