use serde::{Deserialize, Serialize};

/// A single line of the source transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line text without its terminator
    pub text: String,
    /// 0-based position in the transcript
    pub ordinal: usize,
}

impl RawLine {
    /// Whether the line holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split transcript text into raw lines, keeping blank lines
pub fn split_lines(text: &str) -> Vec<RawLine> {
    text.lines()
        .enumerate()
        .map(|(ordinal, line)| RawLine {
            text: line.to_string(),
            ordinal,
        })
        .collect()
}

/// A contiguous span of transcript lines identified as one letter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    /// 1-based sequence number, assigned at emission time
    pub number: u32,
    /// Cleaned letter body
    pub text: String,
    /// Ordinal of the first source line (0 when unknown, e.g. read back from output)
    pub first_line: usize,
    /// Number of source lines the letter spans
    pub line_count: usize,
}

impl Letter {
    /// Header line written above the body
    pub fn header(&self) -> String {
        format!("Letter {}", self.number)
    }

    /// Header, blank line, then body
    pub fn to_record(&self) -> String {
        format!("{}\n\n{}\n", self.header(), self.text)
    }

    /// Non-empty lines of the body, trimmed
    pub fn content_lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Reassign sequence numbers 1..N in ascending order of the existing numbers
///
/// The sort is stable, so letters sharing a number keep their relative order
/// and each takes the next unused integer. Running this on its own output
/// changes nothing.
pub fn renumber(mut letters: Vec<Letter>) -> Vec<Letter> {
    letters.sort_by_key(|l| l.number);
    for (index, letter) in letters.iter_mut().enumerate() {
        letter.number = index as u32 + 1;
    }
    letters
}

/// Whether numbers form the dense run 1..=N in order
pub fn is_densely_numbered(letters: &[Letter]) -> bool {
    letters
        .iter()
        .enumerate()
        .all(|(i, l)| l.number as usize == i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter(number: u32, text: &str) -> Letter {
        Letter {
            number,
            text: text.to_string(),
            first_line: 0,
            line_count: 1,
        }
    }

    #[test]
    fn test_split_lines_keeps_blanks() {
        let lines = split_lines("a\n\nb\n");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_blank());
        assert_eq!(lines[2].ordinal, 2);
    }

    #[test]
    fn test_renumber_ties_take_next_integer() {
        let letters = vec![
            letter(30, "thirty"),
            letter(2, "two"),
            letter(30, "thirty again"),
            letter(1030, "split off"),
        ];

        let renumbered = renumber(letters);

        let numbers: Vec<u32> = renumbered.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(renumbered[0].text, "two");
        assert_eq!(renumbered[1].text, "thirty");
        assert_eq!(renumbered[2].text, "thirty again");
        assert_eq!(renumbered[3].header(), "Letter 4");
    }

    #[test]
    fn test_renumber_is_idempotent() {
        let letters = vec![letter(5, "a"), letter(5, "b"), letter(3, "c")];
        let once = renumber(letters);
        let twice = renumber(once.clone());
        assert_eq!(once, twice);
        assert!(is_densely_numbered(&twice));
    }

    #[test]
    fn test_to_record() {
        assert_eq!(letter(7, "Dear Liz,").to_record(), "Letter 7\n\nDear Liz,\n");
    }
}
