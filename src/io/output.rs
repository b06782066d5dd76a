use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::CorpusError;
use crate::models::{
    renumber, EntityType, Letter, LetterMetadata, MentionWarning, RawMention, MENTION_HEADER,
};
use crate::stages::NormalizedRow;

use super::read_letter_dir;

const WARNING_HEADER: [&str; 4] = ["source_line", "letter_number", "entity_name", "reason"];

const METADATA_HEADER: [&str; 9] = [
    "letter_number",
    "date",
    "year",
    "month",
    "day",
    "sent_from",
    "recipient",
    "sender",
    "filename",
];

/// File name for one letter: `<prefix>_Letter{N}.txt`
pub fn letter_filename(prefix: &str, number: u32) -> String {
    format!("{}_Letter{}.txt", prefix, number)
}

fn create(path: &Path) -> Result<File, CorpusError> {
    File::create(path).map_err(|e| CorpusError::write(path, e))
}

/// Write all letters to one file as `Letter {N}` records separated by blank lines
pub fn write_letters_file(path: &Path, letters: &[Letter]) -> Result<(), CorpusError> {
    let mut file = create(path)?;
    for letter in letters {
        writeln!(file, "{}", letter.to_record()).map_err(|e| CorpusError::write(path, e))?;
    }
    file.flush().map_err(|e| CorpusError::write(path, e))
}

/// Write each letter to `<dir>/<prefix>_Letter{N}.txt`
pub fn write_letter_dir(
    dir: &Path,
    prefix: &str,
    letters: &[Letter],
) -> Result<Vec<PathBuf>, CorpusError> {
    std::fs::create_dir_all(dir).map_err(|e| CorpusError::write(dir, e))?;

    letters
        .iter()
        .map(|letter| {
            let path = dir.join(letter_filename(prefix, letter.number));
            std::fs::write(&path, letter.to_record()).map_err(|e| CorpusError::write(&path, e))?;
            Ok(path)
        })
        .collect()
}

/// Renumber the `<prefix>_Letter{N}.txt` files in a directory to 1..N
///
/// New files are staged in a subdirectory first so no letter is overwritten
/// before every renumbered copy exists.
pub fn renumber_letter_dir(dir: &Path, prefix: &str) -> anyhow::Result<usize> {
    let existing = read_letter_dir(dir, prefix)?;
    let (old_paths, letters): (Vec<PathBuf>, Vec<Letter>) = existing.into_iter().unzip();
    let letters = renumber(letters);

    let staging = dir.join(".renumber-staging");
    let staged = write_letter_dir(&staging, prefix, &letters)?;

    for path in &old_paths {
        std::fs::remove_file(path).map_err(|e| CorpusError::write(path, e))?;
    }
    for path in &staged {
        if let Some(name) = path.file_name() {
            let target = dir.join(name);
            std::fs::rename(path, &target).map_err(|e| CorpusError::write(&target, e))?;
        }
    }
    std::fs::remove_dir(&staging).map_err(|e| CorpusError::write(&staging, e))?;

    info!("Renumbered {} letters in {:?}", letters.len(), dir);
    Ok(letters.len())
}

fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), CorpusError> {
    let file = create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    let to_io = |e: csv::Error| CorpusError::write(path, e.into());
    writer.write_record(header).map_err(to_io)?;
    for row in rows {
        writer.serialize(row).map_err(to_io)?;
    }
    writer.flush().map_err(|e| CorpusError::write(path, e))?;

    debug!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Write the clean mention table
pub fn write_mentions_csv(path: &Path, rows: &[NormalizedRow]) -> Result<(), CorpusError> {
    let mentions: Vec<_> = rows.iter().map(|r| &r.mention).collect();
    write_csv(path, &MENTION_HEADER, &mentions)
}

/// Write an extractor's raw mention rows in the input table format
pub fn write_raw_mentions_csv(path: &Path, rows: &[RawMention]) -> Result<(), CorpusError> {
    let records: Vec<(Option<&str>, &str, Option<EntityType>)> = rows
        .iter()
        .map(|r| (r.letter_number.as_deref(), r.entity_name.as_str(), r.entity_type))
        .collect();
    write_csv(path, &MENTION_HEADER, &records)
}

/// Write the manual-review report
pub fn write_warnings_csv(path: &Path, warnings: &[MentionWarning]) -> Result<(), CorpusError> {
    write_csv(path, &WARNING_HEADER, warnings)
}

/// Write per-letter metadata
pub fn write_metadata_csv(path: &Path, metadata: &[LetterMetadata]) -> Result<(), CorpusError> {
    write_csv(path, &METADATA_HEADER, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{parse_letters_file, read_letter_dir};
    use crate::models::{EntityType, Mention, WarningReason};

    fn letter(number: u32, text: &str) -> Letter {
        Letter {
            number,
            text: text.to_string(),
            first_line: 0,
            line_count: 1,
        }
    }

    #[test]
    fn test_letters_file_round_trips_through_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letters.txt");
        let letters = vec![letter(1, "Monday\n\nbody"), letter(2, "Tuesday")];

        write_letters_file(&path, &letters).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("Letter 1\n\nMonday\n\nbody\n\nLetter 2\n\nTuesday\n"));
        let parsed = parse_letters_file(&text);
        assert_eq!(parsed[1].text, "Tuesday");
    }

    #[test]
    fn test_renumber_letter_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("EFM_Letter30.txt"), "Letter 30\n\nfirst half").unwrap();
        std::fs::write(dir.path().join("EFM_Letter1030.txt"), "Letter 1030\n\nsecond half").unwrap();
        std::fs::write(dir.path().join("EFM_Letter4.txt"), "Letter 4\n\nearlier").unwrap();

        assert_eq!(renumber_letter_dir(dir.path(), "EFM").unwrap(), 3);

        let letters = read_letter_dir(dir.path(), "EFM").unwrap();
        let numbers: Vec<u32> = letters.iter().map(|(_, l)| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(letters[0].1.text, "earlier");
        assert_eq!(letters[2].1.text, "second half");

        let third = std::fs::read_to_string(dir.path().join("EFM_Letter3.txt")).unwrap();
        assert!(third.starts_with("Letter 3\n\n"));
        assert!(!dir.path().join("EFM_Letter30.txt").exists());
        assert!(!dir.path().join(".renumber-staging").exists());

        // Idempotent
        renumber_letter_dir(dir.path(), "EFM").unwrap();
        let again = read_letter_dir(dir.path(), "EFM").unwrap();
        assert_eq!(
            again.iter().map(|(_, l)| l.clone()).collect::<Vec<_>>(),
            letters.iter().map(|(_, l)| l.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_write_mentions_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        let rows = vec![
            NormalizedRow {
                mention: Mention {
                    letter_number: Some(12),
                    entity_name: "Mill Town".to_string(),
                    entity_type: EntityType::Location,
                },
                source_line: 3,
            },
            NormalizedRow {
                mention: Mention {
                    letter_number: None,
                    entity_name: "Sans Souci".to_string(),
                    entity_type: EntityType::Location,
                },
                source_line: 4,
            },
        ];

        write_mentions_csv(&path, &rows).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "letter_number,entity_name,entity_type\n12,Mill Town,LOCATION\n,Sans Souci,LOCATION\n"
        );
    }

    #[test]
    fn test_raw_mentions_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        let rows = vec![
            RawMention::new(3, "Liz", EntityType::Person),
            RawMention::new(3, "Greenville", EntityType::Location),
        ];

        write_raw_mentions_csv(&path, &rows).unwrap();
        let read = crate::io::read_mention_file(&path).unwrap();

        assert_eq!(read.len(), 2);
        assert_eq!(read[1].parsed_letter_number(), Some(3));
        assert_eq!(read[1].entity_name, "Greenville");
        assert_eq!(read[1].entity_type, Some(EntityType::Location));
    }

    #[test]
    fn test_write_warnings_csv_with_no_rows_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warnings.csv");
        write_warnings_csv(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "source_line,letter_number,entity_name,reason\n"
        );

        let warning = MentionWarning {
            source_line: 2,
            letter_number: None,
            entity_name: "Greenville".to_string(),
            reason: WarningReason::UnknownLetter,
        };
        write_warnings_csv(&path, &[warning]).unwrap();
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .ends_with("2,,Greenville,unknown_letter\n"));
    }

    #[test]
    fn test_unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("letters.txt");
        let err = write_letters_file(&path, &[letter(1, "x")]).unwrap_err();
        assert!(matches!(err, CorpusError::Write { .. }));
    }
}
