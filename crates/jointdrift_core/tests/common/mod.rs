#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// One row of a synthetic legacy export.
pub struct LegacyRow<'a> {
    pub story: Option<&'a str>,
    pub label: &'a str,
    pub output_case: &'a str,
    pub step_number: Option<f64>,
    pub drift_x: Option<f64>,
}

impl<'a> LegacyRow<'a> {
    pub fn new(story: &'a str, label: &'a str, output_case: &'a str, step_number: f64) -> Self {
        Self {
            story: Some(story),
            label,
            output_case,
            step_number: Some(step_number),
            drift_x: Some(0.001),
        }
    }
}

/// Writes a legacy export file with the exact exported column names.
pub fn create_legacy_store(dir: &Path, rows: &[LegacyRow<'_>]) -> PathBuf {
    let path = dir.join("export.accdb.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        r#"CREATE TABLE "Joint Drifts" (
            "Story" TEXT,
            "Label" TEXT,
            "Unique Name" TEXT,
            "Output Case" TEXT,
            "Case Type" TEXT,
            "Step Type" TEXT,
            "Step Number" REAL,
            "Step Label" TEXT,
            "Disp X" REAL,
            "Disp Y" REAL,
            "Drift  X" REAL,
            "Drift Y" REAL
        );"#,
    )
    .unwrap();

    for (index, row) in rows.iter().enumerate() {
        conn.execute(
            r#"INSERT INTO "Joint Drifts" (
                "Story", "Label", "Unique Name", "Output Case", "Case Type", "Step Type",
                "Step Number", "Step Label", "Disp X", "Disp Y", "Drift  X", "Drift Y"
            ) VALUES (?1, ?2, ?3, ?4, 'LinStatic', NULL, ?5, NULL, ?6, 0.5, ?7, 0.0002);"#,
            params![
                row.story,
                row.label,
                format!("{}", 100 + index),
                row.output_case,
                row.step_number,
                index as f64 * 0.1,
                row.drift_x,
            ],
        )
        .unwrap();
    }
    path
}

/// Fixture with cases `ELF X` (three rows) and `RSA` (one row).
pub fn standard_rows() -> Vec<LegacyRow<'static>> {
    vec![
        LegacyRow::new("L1", "7", "ELF X", 0.0),
        LegacyRow::new("L2", "7", "ELF X", 0.0),
        LegacyRow::new("L1", "J-12", "RSA", 1.5),
        LegacyRow::new("L1", "9", "ELF X", 2.0),
    ]
}

/// Writes a database file that has no `Joint Drifts` table.
pub fn create_unrelated_store(dir: &Path) -> PathBuf {
    let path = dir.join("unrelated.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE other (id INTEGER PRIMARY KEY);")
        .unwrap();
    path
}

/// Overwrites one column of every row with raw text.
pub fn set_text_cell(path: &Path, column: &str, text: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        &format!(r#"UPDATE "Joint Drifts" SET "{column}" = ?1;"#),
        [text],
    )
    .unwrap();
}
