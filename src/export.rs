//! Tabular views over materialized author results, for handing off to
//! data-analysis tooling. Three interchangeable shapes: a labeled table, a
//! struct-of-vectors columnar batch, and a flat numeric array. All of them
//! are plain conversions over an already-fetched slice; nothing here talks
//! to the store.

use std::fmt;

use bson::oid::ObjectId;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::Author;

pub const AUTHOR_COLUMNS: [&str; 4] = ["_id", "first_name", "last_name", "date_of_birth"];

/// Row-major tabular form with labeled columns. Cells are already rendered
/// to text; `Display` prints an aligned table.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl AuthorFrame {
    pub fn from_authors(authors: &[Author]) -> Self {
        let rows = authors
            .iter()
            .map(|author| {
                vec![
                    author.id.map(|id| id.to_hex()).unwrap_or_default(),
                    author.first_name.clone(),
                    author.last_name.clone(),
                    author
                        .date_of_birth
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                ]
            })
            .collect();

        Self {
            columns: AUTHOR_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for AuthorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{:width$}", column, width = widths[i])?;
        }
        writeln!(f)?;

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:width$}", cell, width = widths[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Columnar form: one typed vector per field, all the same length, row
/// order preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorColumns {
    pub ids: Vec<Option<ObjectId>>,
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub dates_of_birth: Vec<DateTime<Utc>>,
}

impl AuthorColumns {
    pub fn from_authors(authors: &[Author]) -> Self {
        let mut columns = Self::default();
        for author in authors {
            columns.ids.push(author.id);
            columns.first_names.push(author.first_name.clone());
            columns.last_names.push(author.last_name.clone());
            columns.dates_of_birth.push(author.date_of_birth);
        }
        columns
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Flat numeric form of the one numeric-convertible column: dates of
    /// birth as epoch milliseconds.
    pub fn date_of_birth_epoch_ms(&self) -> Vec<i64> {
        self.dates_of_birth
            .iter()
            .map(|date| date.timestamp_millis())
            .collect()
    }

    /// The labeled-table form of the same data.
    pub fn to_frame(&self) -> AuthorFrame {
        let rows = (0..self.len())
            .map(|i| {
                vec![
                    self.ids[i].map(|id| id.to_hex()).unwrap_or_default(),
                    self.first_names[i].clone(),
                    self.last_names[i].clone(),
                    self.dates_of_birth[i].to_rfc3339_opts(SecondsFormat::Secs, true),
                ]
            })
            .collect();

        AuthorFrame {
            columns: AUTHOR_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_authors() -> Vec<Author> {
        vec![
            Author {
                id: Some(ObjectId::new()),
                first_name: "George".to_string(),
                last_name: "Orwell".to_string(),
                date_of_birth: Utc.with_ymd_and_hms(1903, 6, 25, 0, 0, 0).unwrap(),
            },
            Author {
                id: Some(ObjectId::new()),
                first_name: "Herman".to_string(),
                last_name: "Melville".to_string(),
                date_of_birth: Utc.with_ymd_and_hms(1819, 8, 1, 0, 0, 0).unwrap(),
            },
        ]
    }

    #[test]
    fn frame_and_columns_agree_on_rows_and_order() {
        let authors = sample_authors();
        let frame = AuthorFrame::from_authors(&authors);
        let columns = AuthorColumns::from_authors(&authors);

        assert_eq!(frame.len(), 2);
        assert_eq!(columns.len(), 2);
        assert_eq!(frame.columns, AUTHOR_COLUMNS.to_vec());
        assert_eq!(columns.to_frame(), frame);
        assert_eq!(frame.rows[0][1], "George");
        assert_eq!(frame.rows[1][2], "Melville");
    }

    #[test]
    fn epoch_ms_matches_chrono_arithmetic() {
        let authors = vec![Author {
            id: None,
            first_name: "Day".to_string(),
            last_name: "Two".to_string(),
            date_of_birth: Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap(),
        }];

        let columns = AuthorColumns::from_authors(&authors);
        assert_eq!(columns.date_of_birth_epoch_ms(), vec![86_400_000]);
    }

    #[test]
    fn display_renders_aligned_header_and_rows() {
        let authors = sample_authors();
        let rendered = AuthorFrame::from_authors(&authors).to_string();
        let mut lines = rendered.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("_id"));
        assert!(header.contains("date_of_birth"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn empty_input_yields_empty_forms() {
        let frame = AuthorFrame::from_authors(&[]);
        let columns = AuthorColumns::from_authors(&[]);
        assert!(frame.is_empty());
        assert!(columns.is_empty());
        assert!(columns.date_of_birth_epoch_ms().is_empty());
    }
}
