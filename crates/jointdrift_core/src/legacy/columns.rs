//! Column contract and typed row decoding for the legacy `Joint Drifts` table.
//!
//! # Responsibility
//! - Name every legacy column exactly as the exporting software writes it.
//! - Map one row of cells to a `JointDriftItem` with explicit defaults.
//!
//! # Invariants
//! - Absent and NULL text cells decode to `""`.
//! - Absent and NULL numeric cells decode to `0.0`.
//! - Decoding never touches a connection; any `CellSource` will do.

use crate::model::joint_drift::JointDriftItem;
use rusqlite::types::Value;
use rusqlite::Row;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TABLE_JOINT_DRIFTS: &str = "Joint Drifts";

pub const COL_STORY: &str = "Story";
pub const COL_LABEL: &str = "Label";
pub const COL_UNIQUE_NAME: &str = "Unique Name";
pub const COL_OUTPUT_CASE: &str = "Output Case";
pub const COL_CASE_TYPE: &str = "Case Type";
pub const COL_STEP_TYPE: &str = "Step Type";
pub const COL_STEP_NUMBER: &str = "Step Number";
pub const COL_STEP_LABEL: &str = "Step Label";
pub const COL_DISP_X: &str = "Disp X";
pub const COL_DISP_Y: &str = "Disp Y";
/// Exported with two spaces between `Drift` and `X`.
pub const COL_DRIFT_X: &str = "Drift  X";
pub const COL_DRIFT_Y: &str = "Drift Y";

/// Every legacy column in export order.
pub const ALL_COLUMNS: [&str; 12] = [
    COL_STORY,
    COL_LABEL,
    COL_UNIQUE_NAME,
    COL_OUTPUT_CASE,
    COL_CASE_TYPE,
    COL_STEP_TYPE,
    COL_STEP_NUMBER,
    COL_STEP_LABEL,
    COL_DISP_X,
    COL_DISP_Y,
    COL_DRIFT_X,
    COL_DRIFT_Y,
];

/// A cell could not be converted to its field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub column: String,
    pub message: String,
}

impl DecodeError {
    fn new(column: &str, message: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value in column `{}`: {}", self.column, self.message)
    }
}

impl Error for DecodeError {}

/// Named access to the cells of one row.
///
/// Implementations return `Value::Null` for columns the row does not have.
pub trait CellSource {
    fn cell(&self, column: &str) -> Result<Value, DecodeError>;
}

impl CellSource for Row<'_> {
    fn cell(&self, column: &str) -> Result<Value, DecodeError> {
        match self.get::<_, Value>(column) {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::InvalidColumnName(_)) => Ok(Value::Null),
            Err(err) => Err(DecodeError::new(column, err.to_string())),
        }
    }
}

/// In-memory row keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRow {
    cells: HashMap<String, Value>,
}

impl SyntheticRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one cell, replacing any earlier value.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    /// Sets one text cell.
    pub fn with_text(self, column: &str, value: &str) -> Self {
        self.with(column, Value::Text(value.to_string()))
    }
}

impl CellSource for SyntheticRow {
    fn cell(&self, column: &str) -> Result<Value, DecodeError> {
        Ok(self.cells.get(column).cloned().unwrap_or(Value::Null))
    }
}

/// Decodes one legacy row into a record.
pub fn decode_joint_drift_item(row: &impl CellSource) -> Result<JointDriftItem, DecodeError> {
    Ok(JointDriftItem {
        story: text_cell(row, COL_STORY)?,
        label: text_cell(row, COL_LABEL)?,
        unique_name: text_cell(row, COL_UNIQUE_NAME)?,
        output_case: text_cell(row, COL_OUTPUT_CASE)?,
        case_type: text_cell(row, COL_CASE_TYPE)?,
        step_type: text_cell(row, COL_STEP_TYPE)?,
        step_number: real_cell(row, COL_STEP_NUMBER)?,
        step_label: text_cell(row, COL_STEP_LABEL)?,
        disp_x: real_cell(row, COL_DISP_X)?,
        disp_y: real_cell(row, COL_DISP_Y)?,
        drift_x: real_cell(row, COL_DRIFT_X)?,
        drift_y: real_cell(row, COL_DRIFT_Y)?,
    })
}

/// Reads a cell as text using the text default policy.
pub fn text_cell(row: &impl CellSource, column: &str) -> Result<String, DecodeError> {
    Ok(value_to_text(row.cell(column)?))
}

/// Reads a cell as a number using the numeric default policy.
///
/// NaN and infinities are rejected; text such as `NaN` or `inf` parses as
/// a float but cannot be stored.
pub fn real_cell(row: &impl CellSource, column: &str) -> Result<f64, DecodeError> {
    let value = match row.cell(column)? {
        Value::Null => 0.0,
        Value::Integer(value) => value as f64,
        Value::Real(value) => value,
        Value::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| DecodeError::new(column, format!("`{text}` is not a number")))?
        }
        Value::Blob(_) => return Err(DecodeError::new(column, "binary data is not a number")),
    };
    if !value.is_finite() {
        return Err(DecodeError::new(column, format!("`{value}` is not a finite number")));
    }
    Ok(value)
}

pub(crate) fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(text) => text,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_joint_drift_item, SyntheticRow, COL_DISP_X, COL_DISP_Y, COL_DRIFT_X, COL_DRIFT_Y,
        COL_LABEL, COL_OUTPUT_CASE, COL_STEP_NUMBER, COL_STORY, COL_UNIQUE_NAME,
    };
    use rusqlite::types::Value;

    #[test]
    fn decodes_every_mapped_column() {
        let row = SyntheticRow::new()
            .with_text(COL_STORY, "L3")
            .with_text(COL_LABEL, "J-12")
            .with_text(COL_UNIQUE_NAME, "412")
            .with_text(COL_OUTPUT_CASE, "ELF X")
            .with(COL_STEP_NUMBER, 2.5)
            .with(COL_DISP_X, 0.012)
            .with(COL_DRIFT_X, 0.0031)
            .with(COL_DRIFT_Y, 0.0007);

        let item = decode_joint_drift_item(&row).unwrap();
        assert_eq!(item.story, "L3");
        assert_eq!(item.label, "J-12");
        assert_eq!(item.unique_name, "412");
        assert_eq!(item.output_case, "ELF X");
        assert_eq!(item.step_number, 2.5);
        assert_eq!(item.disp_x, 0.012);
        assert_eq!(item.drift_x, 0.0031);
        assert_eq!(item.drift_y, 0.0007);
    }

    #[test]
    fn null_and_missing_cells_take_defaults() {
        let row = SyntheticRow::new()
            .with(COL_STORY, Value::Null)
            .with(COL_STEP_NUMBER, Value::Null);

        let item = decode_joint_drift_item(&row).unwrap();
        assert_eq!(item.story, "");
        assert_eq!(item.label, "");
        assert_eq!(item.step_number, 0.0);
        assert_eq!(item.drift_y, 0.0);
    }

    #[test]
    fn numeric_labels_and_text_numbers_convert() {
        let row = SyntheticRow::new()
            .with(COL_LABEL, 17_i64)
            .with_text(COL_STEP_NUMBER, " 3 ")
            .with(COL_DISP_X, 4_i64);

        let item = decode_joint_drift_item(&row).unwrap();
        assert_eq!(item.label, "17");
        assert_eq!(item.step_number, 3.0);
        assert_eq!(item.disp_x, 4.0);
    }

    #[test]
    fn non_numeric_text_in_numeric_column_is_an_error() {
        let row = SyntheticRow::new().with_text(COL_DRIFT_X, "n/a");
        let err = decode_joint_drift_item(&row).unwrap_err();
        assert_eq!(err.column, COL_DRIFT_X);
    }

    #[test]
    fn non_finite_text_in_numeric_column_is_an_error() {
        for text in ["NaN", "inf", "-Infinity"] {
            let row = SyntheticRow::new().with_text(COL_DISP_Y, text);
            let err = decode_joint_drift_item(&row).unwrap_err();
            assert_eq!(err.column, COL_DISP_Y);
        }
    }
}
