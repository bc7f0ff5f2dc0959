//! Streaming reader over the legacy `Joint Drifts` table.
//!
//! # Responsibility
//! - Discover the analysis cases present in the store.
//! - Fetch and decode rows, all of them or those of one case.
//!
//! # Invariants
//! - Every query needs an already open connection (`ConnectionError::NotOpen`
//!   otherwise, never a query error).
//! - Predicates are bound parameters, never concatenated text.
//! - A failed or cancelled query yields no partial result and leaves the
//!   connection open.

use crate::cancel::CancellationToken;
use crate::legacy::columns::{
    decode_joint_drift_item, value_to_text, DecodeError, COL_OUTPUT_CASE, TABLE_JOINT_DRIFTS,
};
use crate::legacy::connection::{ConnectionError, LegacyConnectionProvider};
use crate::model::joint_drift::JointDriftItem;
use log::{error, info, warn};
use rusqlite::types::Value;
use rusqlite::{Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ImportResult<T> = Result<T, ImportError>;

/// Failures while reading the legacy store.
#[derive(Debug)]
pub enum ImportError {
    Connection(ConnectionError),
    Query {
        context: String,
        source: rusqlite::Error,
    },
    Decode {
        context: String,
        source: DecodeError,
    },
    Cancelled {
        context: String,
    },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "{err}"),
            Self::Query { context, source } => {
                write!(f, "legacy query failed ({context}): {source}")
            }
            Self::Decode { context, source } => {
                write!(f, "legacy row could not be decoded ({context}): {source}")
            }
            Self::Cancelled { context } => write!(f, "legacy read cancelled ({context})"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            Self::Query { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }
}

impl From<ConnectionError> for ImportError {
    fn from(value: ConnectionError) -> Self {
        Self::Connection(value)
    }
}

/// Reader bound to a connection provider for its whole lifetime.
pub struct JointDriftImportReader<'p> {
    provider: &'p LegacyConnectionProvider,
}

impl<'p> JointDriftImportReader<'p> {
    pub fn new(provider: &'p LegacyConnectionProvider) -> Self {
        Self { provider }
    }

    /// Returns the distinct non-NULL `Output Case` values.
    ///
    /// Order is whatever the store yields; callers must not rely on it.
    pub fn unique_case_names(&self, cancel: &CancellationToken) -> ImportResult<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {} FROM {};",
            quote_ident(COL_OUTPUT_CASE),
            quote_ident(TABLE_JOINT_DRIFTS)
        );
        self.run_query("unique_case_names", "all cases", &sql, [], cancel, |row| {
            match row.get::<_, Value>(0) {
                Ok(Value::Null) => Ok(None),
                Ok(value) => Ok(Some(value_to_text(value))),
                Err(source) => Err(RowFailure::Query(source)),
            }
        })
    }

    /// Returns every row whose `Output Case` equals `output_case` exactly.
    ///
    /// No match yields an empty vector.
    pub fn entries_by_case(
        &self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> ImportResult<Vec<JointDriftItem>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1;",
            quote_ident(TABLE_JOINT_DRIFTS),
            quote_ident(COL_OUTPUT_CASE)
        );
        let context = format!("case `{output_case}`");
        self.run_query("entries_by_case", &context, &sql, [output_case], cancel, |row| {
            decode_joint_drift_item(row)
                .map(Some)
                .map_err(RowFailure::Decode)
        })
    }

    /// Returns every row of the table in store order.
    pub fn all_entries(&self, cancel: &CancellationToken) -> ImportResult<Vec<JointDriftItem>> {
        let sql = format!("SELECT * FROM {};", quote_ident(TABLE_JOINT_DRIFTS));
        self.run_query("all_entries", "all cases", &sql, [], cancel, |row| {
            decode_joint_drift_item(row)
                .map(Some)
                .map_err(RowFailure::Decode)
        })
    }

    fn run_query<T, P, F>(
        &self,
        query: &str,
        context: &str,
        sql: &str,
        params: P,
        cancel: &CancellationToken,
        mut map_row: F,
    ) -> ImportResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> Result<Option<T>, RowFailure>,
    {
        let conn = self.provider.require_connection()?;
        let started_at = Instant::now();
        let cancelled = || {
            warn!(
                "event=legacy_query module=import status=cancelled query={query} context=\"{context}\""
            );
            ImportError::Cancelled {
                context: context.to_string(),
            }
        };
        let query_failed = |source: rusqlite::Error| {
            error!(
                "event=legacy_query module=import status=error query={query} context=\"{context}\" duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                source
            );
            ImportError::Query {
                context: context.to_string(),
                source,
            }
        };

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let mut stmt = conn.prepare(sql).map_err(query_failed)?;
        let mut rows = stmt.query(params).map_err(query_failed)?;
        let mut results = Vec::new();

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }
            let Some(row) = rows.next().map_err(query_failed)? else {
                break;
            };
            match map_row(row) {
                Ok(Some(value)) => results.push(value),
                Ok(None) => {}
                Err(RowFailure::Query(source)) => return Err(query_failed(source)),
                Err(RowFailure::Decode(source)) => {
                    error!(
                        "event=legacy_query module=import status=error query={query} context=\"{context}\" error_code=decode_failed error={}",
                        source
                    );
                    return Err(ImportError::Decode {
                        context: context.to_string(),
                        source,
                    });
                }
            }
        }

        info!(
            "event=legacy_query module=import status=ok query={query} context=\"{context}\" rows={} duration_ms={}",
            results.len(),
            started_at.elapsed().as_millis()
        );
        Ok(results)
    }
}

enum RowFailure {
    Query(rusqlite::Error),
    Decode(DecodeError),
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::quote_ident;

    #[test]
    fn quote_ident_keeps_interior_spacing() {
        assert_eq!(quote_ident("Drift  X"), "\"Drift  X\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
