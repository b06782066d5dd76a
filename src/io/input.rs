use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use regex::Regex;
use tracing::{debug, warn};

use crate::heuristics::clean_letter_text;
use crate::models::{parse_letter_number, EntityType, Letter, RawMention, MENTION_HEADER};

/// Header line opening each record in segmented output
static LETTER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Letter\s+(\d+)\s*$").expect("valid regex"));

/// Read a file as text, replacing undecodable bytes instead of failing
pub fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            warn!("{:?} is not valid UTF-8; undecodable bytes were replaced", path);
            text
        }
    })
}

/// Parse a raw mention table
///
/// Every physical line is one row: quote characters are kept literally so
/// that rows broken by multi-line names surface as continuation rows.
pub fn parse_mention_csv(text: &str) -> Result<Vec<RawMention>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.context("Failed to read mention row")?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);

        let fields: Vec<&str> = record.iter().collect();
        if fields.iter().all(|f| f.trim().is_empty()) || is_header(&fields) {
            continue;
        }
        rows.push(raw_mention_from_fields(&fields, line));
    }

    debug!("Read {} mention rows", rows.len());
    Ok(rows)
}

/// Read and parse a raw mention table from disk
pub fn read_mention_file(path: &Path) -> Result<Vec<RawMention>> {
    let text = read_text_lossy(path)?;
    parse_mention_csv(&text).with_context(|| format!("Failed to parse mention table: {:?}", path))
}

fn is_header(fields: &[&str]) -> bool {
    fields.len() == MENTION_HEADER.len()
        && fields
            .iter()
            .zip(MENTION_HEADER.iter())
            .all(|(f, h)| f.trim().eq_ignore_ascii_case(h))
}

/// Map 1 to N fields onto (letter_number, entity_name, entity_type)
///
/// Short rows whose first field is not a letter number were shifted left by
/// an upstream break and are read as `(name)` or `(name, type)`. Rows with
/// extra fields had unquoted commas inside the name.
fn raw_mention_from_fields(fields: &[&str], line: usize) -> RawMention {
    let (letter_number, entity_name, entity_type) = match fields {
        [only] if parse_letter_number(only).is_some() => (cell(only), String::new(), None),
        [only] => (None, only.to_string(), None),
        [first, second] if holds_letter_number(first) => (cell(first), second.to_string(), None),
        [first, second] => match EntityType::parse(second) {
            Some(t) => (None, first.to_string(), Some(t)),
            None => (cell(first), second.to_string(), None),
        },
        [first, name, kind] => (cell(first), name.to_string(), EntityType::parse(kind)),
        [first, middle @ .., last] => match EntityType::parse(last) {
            Some(t) => (cell(first), middle.join(","), Some(t)),
            None => (cell(first), fields[1..].join(","), None),
        },
        [] => (None, String::new(), None),
    };

    RawMention {
        letter_number,
        entity_name,
        entity_type,
        field_count: fields.len(),
        source_line: line,
    }
}

fn cell(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A valid number, or an empty cell left where the number was dropped
fn holds_letter_number(value: &str) -> bool {
    value.trim().is_empty() || parse_letter_number(value).is_some()
}

/// Parse a combined letters file of `Letter {N}` records
///
/// Text before the first header is kept as a letter numbered 0 so that
/// renumbering places it first instead of losing it.
pub fn parse_letters_file(text: &str) -> Vec<Letter> {
    let mut letters = Vec::new();
    let mut current: Option<(u32, usize, Vec<&str>)> = None;

    for (ordinal, line) in text.lines().enumerate() {
        if let Some(caps) = LETTER_HEADER.captures(line) {
            if let Some((number, first_line, body)) = current.take() {
                letters.push(build_letter(number, first_line, &body));
            }
            let number = caps[1].parse().unwrap_or(u32::MAX);
            current = Some((number, ordinal, Vec::new()));
            continue;
        }

        match current.as_mut() {
            Some((_, _, body)) => body.push(line),
            None if line.trim().is_empty() => {}
            None => {
                warn!("Text before the first letter header at line {}", ordinal + 1);
                current = Some((0, ordinal, vec![line]));
            }
        }
    }

    if let Some((number, first_line, body)) = current {
        letters.push(build_letter(number, first_line, &body));
    }
    letters
}

fn build_letter(number: u32, first_line: usize, body: &[&str]) -> Letter {
    Letter {
        number,
        text: clean_letter_text(body.iter().copied()),
        first_line,
        line_count: body.len(),
    }
}

/// Number encoded in a `<prefix>_Letter{N}.txt` file name
pub fn letter_number_from_filename(prefix: &str, filename: &str) -> Option<u32> {
    filename
        .strip_prefix(prefix)?
        .strip_prefix("_Letter")?
        .strip_suffix(".txt")
        .and_then(parse_letter_number)
}

/// Read every `<prefix>_Letter{N}.txt` file in a directory
///
/// The number comes from the file name; a leading `Letter {N}` header line
/// in the file is dropped from the body.
pub fn read_letter_dir(dir: &Path, prefix: &str) -> Result<Vec<(PathBuf, Letter)>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?;

    let mut letters = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("Failed to list directory: {:?}", dir))?.path();
        let Some(number) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| letter_number_from_filename(prefix, n))
        else {
            continue;
        };

        let text = read_text_lossy(&path)?;
        let mut lines = text.lines().peekable();
        if lines.peek().is_some_and(|l| LETTER_HEADER.is_match(l)) {
            lines.next();
        }
        let body: Vec<&str> = lines.collect();
        letters.push((path, build_letter(number, 0, &body)));
    }

    letters.sort_by_key(|(_, l)| l.number);
    debug!("Read {} letter files from {:?}", letters.len(), dir);
    Ok(letters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mention_csv_shapes() {
        let text = "letter_number,entity_name,entity_type\n\
                    12,John Smith,PERSON\n\
                    ,Mill Town,PERSON\n\
                    13,\"Thomas Butler\n\
                    Pendleton\",PERSON\n\
                    14,Anna Perry\n\
                    15,Perry, Benjamin F,PERSON\n";

        let rows = parse_mention_csv(text).unwrap();

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].parsed_letter_number(), Some(12));
        assert_eq!(rows[0].source_line, 2);

        assert_eq!(rows[1].letter_number, None);
        assert_eq!(rows[1].entity_name, "Mill Town");
        assert_eq!(rows[1].entity_type, Some(EntityType::Person));

        assert_eq!(rows[2].entity_name, "\"Thomas Butler");
        assert_eq!(rows[2].entity_type, None);
        assert_eq!(rows[2].field_count, 2);

        // Shifted continuation row: (name, type)
        assert_eq!(rows[3].letter_number, None);
        assert_eq!(rows[3].entity_name, "Pendleton\"");
        assert_eq!(rows[3].entity_type, Some(EntityType::Person));

        assert_eq!(rows[4].entity_type, None);
        assert_eq!(rows[5].entity_name, "Perry, Benjamin F");
        assert_eq!(rows[5].entity_type, Some(EntityType::Person));
    }

    #[test]
    fn test_repeated_header_rows_are_skipped() {
        let text = "letter_number,entity_name,entity_type\n\
                    1,Greenville,LOCATION\n\
                    Letter_Number, Entity_Name ,ENTITY_TYPE\n\
                    2,Liz,PERSON\n";

        let rows = parse_mention_csv(text).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_name, "Greenville");
        assert_eq!(rows[1].parsed_letter_number(), Some(2));
        assert_eq!(rows[1].source_line, 4);
    }

    #[test]
    fn test_single_field_row_is_a_name() {
        let rows = parse_mention_csv("Greenville\n").unwrap();
        assert_eq!(rows[0].letter_number, None);
        assert_eq!(rows[0].entity_name, "Greenville");
        assert_eq!(rows[0].field_count, 1);
    }

    #[test]
    fn test_parse_letters_file() {
        let text = "Letter 2\n\nMonday\nbody\n\n\nLetter 1\n\nTuesday\nmore\n\n";
        let letters = parse_letters_file(text);

        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].number, 2);
        assert_eq!(letters[0].text, "Monday\nbody");
        assert_eq!(letters[1].number, 1);
        assert_eq!(letters[1].text, "Tuesday\nmore");
    }

    #[test]
    fn test_text_before_first_header_is_kept() {
        let letters = parse_letters_file("stray note\nLetter 1\n\nbody\n");
        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].number, 0);
        assert_eq!(letters[0].text, "stray note");
    }

    #[test]
    fn test_letter_number_from_filename() {
        assert_eq!(letter_number_from_filename("BFPerry", "BFPerry_Letter12.txt"), Some(12));
        assert_eq!(letter_number_from_filename("BFPerry", "EFMPerry_Letter12.txt"), None);
        assert_eq!(letter_number_from_filename("BFPerry", "BFPerry_Letter12.md"), None);
    }

    #[test]
    fn test_read_text_lossy_replaces_bad_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, b"Columbia\xff\n").unwrap();

        let text = read_text_lossy(&path).unwrap();
        assert_eq!(text, "Columbia\u{FFFD}\n");
    }

    #[test]
    fn test_read_letter_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BFPerry_Letter2.txt"), "Letter 2\n\nsecond").unwrap();
        std::fs::write(dir.path().join("BFPerry_Letter1.txt"), "Letter 1\n\nfirst").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let letters = read_letter_dir(dir.path(), "BFPerry").unwrap();

        assert_eq!(letters.len(), 2);
        assert_eq!(letters[0].1.number, 1);
        assert_eq!(letters[0].1.text, "first");
        assert_eq!(letters[1].1.text, "second");
    }
}
