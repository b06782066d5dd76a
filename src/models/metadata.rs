use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Per-letter facts recovered from the heading and sign-off lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LetterMetadata {
    pub letter_number: u32,
    /// Date heading as written
    pub date: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    /// Last non-empty line, usually the place of writing
    pub sent_from: String,
    /// Second-to-last non-empty line, usually the addressee
    pub recipient: String,
    pub sender: String,
    pub filename: String,
}

impl LetterMetadata {
    pub fn set_date(&mut self, date: NaiveDate) {
        self.year = Some(date.year());
        self.month = Some(date.month());
        self.day = Some(date.day());
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_date() {
        let mut meta = LetterMetadata::default();
        let date = NaiveDate::from_ymd_opt(1859, 5, 3).unwrap();
        meta.set_date(date);
        assert_eq!(meta.year, Some(1859));
        assert_eq!(meta.parsed_date(), Some(date));
    }
}
