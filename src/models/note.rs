use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A single ED provider note with its visit metadata.
///
/// Produced by the ingestion layer, consumed once per pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Visit identifier (CSN in the source exports).
    pub visit_id: String,
    /// Arrival date of the visit, when known.
    pub date: Option<NaiveDate>,
    /// Raw note text.
    pub text: String,
}

impl Note {
    pub fn new(visit_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            visit_id: visit_id.into(),
            date: None,
            text: text.into(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Arrival year, used for per-year summaries.
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_without_date_has_no_year() {
        let note = Note::new("1001", "denies fever");
        assert_eq!(note.year(), None);
    }

    #[test]
    fn note_year_from_date() {
        let note = Note::new("1001", "denies fever")
            .with_date(NaiveDate::from_ymd_opt(2019, 3, 14).unwrap());
        assert_eq!(note.year(), Some(2019));
    }
}
