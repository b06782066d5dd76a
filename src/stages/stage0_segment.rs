use tracing::{debug, info};

use crate::error::CorpusError;
use crate::heuristics::{clean_letter_text, BoundaryDetector, SegmenterConfig};
use crate::models::{split_lines, Letter};

/// Splits a transcript into letters using place-name sign-offs and date headings
#[derive(Debug, Clone)]
pub struct Segmenter {
    detector: BoundaryDetector,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self, CorpusError> {
        Ok(Self {
            detector: BoundaryDetector::new(config)?,
        })
    }

    pub fn detector(&self) -> &BoundaryDetector {
        &self.detector
    }

    /// Lazily segment `text` into letters numbered from 1
    ///
    /// The returned iterator is `Clone`, so a copy taken before consuming it
    /// replays the same sequence.
    pub fn segment<'a>(&'a self, text: &'a str) -> LetterIter<'a> {
        LetterIter {
            detector: &self.detector,
            lines: text.lines().collect(),
            cursor: 0,
            next_number: 1,
        }
    }
}

/// Iterator over the letters of one transcript
#[derive(Debug, Clone)]
pub struct LetterIter<'a> {
    detector: &'a BoundaryDetector,
    lines: Vec<&'a str>,
    cursor: usize,
    next_number: u32,
}

impl LetterIter<'_> {
    /// Index one past the last line of the letter starting at `start`
    ///
    /// Scans for an end marker, then looks ahead for the next date heading.
    /// Only the end detector runs on the scanned lines; only the start
    /// detector runs during lookahead, so repeated sign-offs fold into the
    /// letter they follow.
    fn letter_end(&self, start: usize) -> usize {
        let len = self.lines.len();
        let Some(marker) = (start..len).find(|&i| self.detector.is_end(self.lines[i])) else {
            return len;
        };

        match (marker + 1..len).find(|&j| self.detector.is_start(self.lines[j])) {
            Some(next_start) => {
                debug!(
                    "Sign-off at line {}, next letter opens at line {}",
                    marker, next_start
                );
                next_start
            }
            None => {
                debug!("Sign-off at line {} with no later date heading", marker);
                len
            }
        }
    }
}

impl Iterator for LetterIter<'_> {
    type Item = Letter;

    fn next(&mut self) -> Option<Letter> {
        let start = self.cursor;

        if start >= self.lines.len() {
            // An empty transcript still yields one (empty) letter
            if self.next_number == 1 {
                self.next_number += 1;
                return Some(Letter {
                    number: 1,
                    text: String::new(),
                    first_line: 0,
                    line_count: 0,
                });
            }
            return None;
        }

        let end = self.letter_end(start);
        self.cursor = end;

        let letter = Letter {
            number: self.next_number,
            text: clean_letter_text(self.lines[start..end].iter().copied()),
            first_line: start,
            line_count: end - start,
        };
        self.next_number += 1;
        Some(letter)
    }
}

/// Result of Stage 0 segmentation
#[derive(Debug)]
pub struct Stage0Result {
    pub letters: Vec<Letter>,
    /// Lines carrying a place-name sign-off
    pub end_markers: usize,
    /// Lines carrying a date heading
    pub start_markers: usize,
}

/// Execute Stage 0: split a transcript into letters
pub fn execute_stage0(segmenter: &Segmenter, text: &str) -> Stage0Result {
    let detector = segmenter.detector();
    let lines = split_lines(text);
    let mut end_markers = 0;
    let mut start_markers = 0;
    for line in lines.iter().filter(|l| !l.is_blank()) {
        if detector.is_end(&line.text) {
            debug!("Sign-off at line {}: {}", line.ordinal, line.text.trim());
            end_markers += 1;
        }
        if detector.is_start(&line.text) {
            start_markers += 1;
        }
    }

    let letters: Vec<Letter> = segmenter.segment(text).collect();

    if end_markers == 0 {
        info!("No sign-off lines found; the transcript is kept as a single letter");
    }
    info!(
        "Segmented {} lines into {} letters ({} sign-offs, {} date headings)",
        lines.len(),
        letters.len(),
        end_markers,
        start_markers
    );

    Stage0Result {
        letters,
        end_markers,
        start_markers,
    }
}
