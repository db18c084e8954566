//! Box inventory loaded from a JSON export of the box spreadsheet.
//!
//! Rows are cleaned before they reach the selector:
//! - column names are accepted in English or with the spreadsheet's headings;
//! - numeric cells may be numbers or numeric text;
//! - once any row carries a status, only rows marked available are kept;
//! - rows without a usable capacity, height, width or length are dropped.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::identifier::normalize_identifier;
use crate::model::CandidateBox;
use crate::types::BoxProvider;

/// Status values (after normalization) that mark a box as available.
const AVAILABLE_STATUSES: &[&str] = &["disponivel", "available"];

/// Errors raised while loading the inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Could not read box inventory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse box inventory {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A spreadsheet cell that should hold a number.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum NumericCell {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl NumericCell {
    fn to_f64(&self) -> Option<f64> {
        let value = match self {
            NumericCell::Number(value) => *value,
            NumericCell::Text(raw) => raw.trim().parse::<f64>().ok()?,
            NumericCell::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// One row of the inventory file.
#[derive(Clone, Debug, Deserialize)]
pub struct BoxRow {
    #[serde(default, rename = "box", alias = "Box", alias = "name")]
    name: Option<serde_json::Value>,
    #[serde(default, alias = "Largura")]
    width: Option<NumericCell>,
    #[serde(default, alias = "Comprimento")]
    length: Option<NumericCell>,
    #[serde(default, alias = "Altura")]
    height: Option<NumericCell>,
    #[serde(default, alias = "Metros Cubicos", alias = "M³")]
    capacity: Option<NumericCell>,
    #[serde(default, alias = "Metros Quadrados", alias = "M²")]
    area: Option<NumericCell>,
    #[serde(default, alias = "Status")]
    status: Option<serde_json::Value>,
}

/// Outcome of checking one row.
#[derive(Debug, PartialEq)]
enum RowVerdict {
    Accepted(CandidateBox),
    Unavailable,
    Malformed(String),
}

fn numeric(cell: &Option<NumericCell>) -> Option<f64> {
    cell.as_ref().and_then(NumericCell::to_f64)
}

impl BoxRow {
    fn label(&self, row_number: usize) -> String {
        let explicit = match &self.name {
            Some(serde_json::Value::String(raw)) => Some(raw.trim().to_string()),
            Some(serde_json::Value::Number(number)) => Some(number.to_string()),
            _ => None,
        };
        explicit
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| format!("box-{}", row_number))
    }

    fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// Status cell as text; `None` for empty cells, booleans and nested values.
    fn status_text(&self) -> Option<String> {
        match &self.status {
            Some(serde_json::Value::String(raw)) => Some(raw.clone()),
            Some(serde_json::Value::Number(number)) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Without a status column every row counts as available.
    fn is_available(&self, status_column: bool) -> bool {
        if !status_column {
            return true;
        }
        self.status_text()
            .is_some_and(|status| AVAILABLE_STATUSES.contains(&normalize_identifier(&status).as_str()))
    }

    fn verdict(&self, row_number: usize, status_column: bool) -> RowVerdict {
        if !self.is_available(status_column) {
            return RowVerdict::Unavailable;
        }

        let label = self.label(row_number);
        let (Some(capacity), Some(height)) = (numeric(&self.capacity), numeric(&self.height))
        else {
            return RowVerdict::Malformed(format!("{}: missing capacity or height", label));
        };
        let (Some(width), Some(length)) = (numeric(&self.width), numeric(&self.length)) else {
            return RowVerdict::Malformed(format!("{}: missing width or length", label));
        };

        match CandidateBox::new(label.clone(), (width, length, height), capacity) {
            Ok(candidate) => RowVerdict::Accepted(candidate.with_area(numeric(&self.area))),
            Err(err) => RowVerdict::Malformed(format!("{}: {}", label, err)),
        }
    }
}

/// Counts of rows left out of the inventory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SkippedRows {
    pub unavailable: usize,
    pub malformed: usize,
}

/// Validated, available boxes in file order.
#[derive(Clone, Debug, Default)]
pub struct BoxInventory {
    boxes: Vec<CandidateBox>,
    skipped: SkippedRows,
}

impl BoxInventory {
    /// Builds an inventory from raw rows, dropping unusable ones.
    pub fn from_rows(rows: Vec<BoxRow>) -> Self {
        let mut boxes = Vec::with_capacity(rows.len());
        let mut skipped = SkippedRows::default();
        let status_column = rows.iter().any(BoxRow::has_status);

        for (index, row) in rows.iter().enumerate() {
            match row.verdict(index + 1, status_column) {
                RowVerdict::Accepted(candidate) => boxes.push(candidate),
                RowVerdict::Unavailable => skipped.unavailable += 1,
                RowVerdict::Malformed(detail) => {
                    tracing::debug!("Skipping inventory row: {}", detail);
                    skipped.malformed += 1;
                }
            }
        }

        if skipped.malformed > 0 {
            tracing::warn!(
                malformed = skipped.malformed,
                "⚠️ Dropped inventory rows without usable capacity or dimensions"
            );
        }

        Self { boxes, skipped }
    }

    /// Parses the inventory from JSON text (an array of row objects).
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let rows: Vec<BoxRow> = serde_json::from_str(raw)?;
        Ok(Self::from_rows(rows))
    }

    /// Reads the inventory from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| InventoryError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn skipped(&self) -> SkippedRows {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl BoxProvider for BoxInventory {
    fn candidates(&self) -> &[CandidateBox] {
        &self.boxes
    }
}

impl From<Vec<CandidateBox>> for BoxInventory {
    fn from(boxes: Vec<CandidateBox>) -> Self {
        Self {
            boxes,
            skipped: SkippedRows::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HasHeight;
    use std::io::Write;

    #[test]
    fn parses_spreadsheet_headings() {
        let raw = r#"[
            {"Box": "B-01", "Largura": 1.5, "Comprimento": 2.0, "Altura": 2.2,
             "Metros Cubicos": 6.6, "Metros Quadrados": 3.0, "Status": "Disponível"}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        let boxes = inventory.candidates();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].id, "B-01");
        assert_eq!(boxes[0].dims, (1.5, 2.0, 2.2));
        assert_eq!(boxes[0].capacity, 6.6);
        assert_eq!(boxes[0].area, Some(3.0));
    }

    #[test]
    fn accepts_short_headings_and_numeric_text() {
        let raw = r#"[
            {"Box": 7, "Largura": "1.0", "Comprimento": " 2 ", "Altura": "2.5", "M³": "5", "M²": "2"}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        let candidate = &inventory.candidates()[0];
        assert_eq!(candidate.id, "7");
        assert_eq!(candidate.height(), 2.5);
        assert_eq!(candidate.capacity, 5.0);
        assert_eq!(candidate.area, Some(2.0));
    }

    #[test]
    fn accepts_english_field_names() {
        let raw = r#"[{"box": "A", "width": 1, "length": 1, "height": 2, "capacity": 2}]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        assert_eq!(inventory.len(), 1);
        let candidate = &inventory.candidates()[0];
        assert_eq!(candidate.width(), 1.0);
        assert_eq!(candidate.length(), 1.0);
        assert_eq!(candidate.height(), 2.0);
        assert_eq!(candidate.area, None);
    }

    #[test]
    fn unavailable_rows_are_filtered() {
        let raw = r#"[
            {"box": "free", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": " disponível "},
            {"box": "rented", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": "Ocupado"},
            {"box": "english", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": "Available"}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        let ids: Vec<&str> = inventory.candidates().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["free", "english"]);
        assert_eq!(inventory.skipped().unavailable, 1);
    }

    #[test]
    fn unlabelled_rows_are_unavailable_when_status_column_exists() {
        let raw = r#"[
            {"box": "free", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": "Disponível"},
            {"box": "blank", "width": 1, "length": 1, "height": 2, "capacity": 1, "status": null},
            {"box": "empty", "width": 1, "length": 1, "height": 2, "capacity": 1, "status": "  "},
            {"box": "missing", "width": 1, "length": 1, "height": 2, "capacity": 1}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        let ids: Vec<&str> = inventory.candidates().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["free"]);
        assert_eq!(inventory.skipped().unavailable, 3);
    }

    #[test]
    fn rows_are_available_without_status_column() {
        let raw = r#"[
            {"box": "a", "width": 1, "length": 1, "height": 2, "capacity": 2},
            {"box": "b", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": null}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.skipped().unavailable, 0);
    }

    #[test]
    fn non_text_status_cells_drop_only_their_row() {
        let raw = r#"[
            {"box": "ok", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": "disponivel"},
            {"box": "numeric", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": 1},
            {"box": "flag", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": true},
            {"box": "list", "width": 1, "length": 1, "height": 2, "capacity": 2, "status": ["disponivel"]}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        let ids: Vec<&str> = inventory.candidates().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
        assert_eq!(inventory.skipped().unavailable, 3);
    }

    #[test]
    fn rows_without_capacity_or_height_are_dropped() {
        let raw = r#"[
            {"box": "no-capacity", "width": 1, "length": 1, "height": 2},
            {"box": "bad-height", "width": 1, "length": 1, "height": "n/a", "capacity": 2},
            {"box": "null-capacity", "width": 1, "length": 1, "height": 2, "capacity": null},
            {"box": "zero-width", "width": 0, "length": 1, "height": 2, "capacity": 2},
            {"box": "ok", "width": 1, "length": 1, "height": 2, "capacity": 2}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.candidates()[0].id, "ok");
        assert_eq!(
            inventory.skipped(),
            SkippedRows {
                unavailable: 0,
                malformed: 4
            }
        );
    }

    #[test]
    fn unnamed_rows_get_positional_label() {
        let raw = r#"[
            {"box": "first", "width": 1, "length": 1, "height": 2, "capacity": 2},
            {"width": 1, "length": 1, "height": 2, "capacity": 3},
            {"box": "  ", "width": 1, "length": 1, "height": 2, "capacity": 4}
        ]"#;
        let inventory = BoxInventory::from_json_str(raw).unwrap();
        let ids: Vec<&str> = inventory.candidates().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "box-2", "box-3"]);
    }

    #[test]
    fn loads_inventory_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"Box": "X", "Largura": 2, "Comprimento": 2, "Altura": 2.5, "Metros Cubicos": 10}}]"#
        )
        .unwrap();

        let inventory = BoxInventory::from_json_file(file.path()).unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn malformed_file_reports_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = BoxInventory::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, InventoryError::Json { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BoxInventory::from_json_file(dir.path().join("boxes.json")).unwrap_err();
        assert!(matches!(err, InventoryError::Io { .. }));
    }
}
