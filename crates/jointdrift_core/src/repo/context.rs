//! Write-side persistence contexts for joint drift aggregates.
//!
//! # Responsibility
//! - Expose the mutable aggregate collection to repositories.
//! - Commit the full aggregate state on `save_changes`.
//!
//! # Invariants
//! - `save_changes` writes every aggregate completely or not at all.
//! - Item order inside an aggregate survives a save/load cycle.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::joint_drift::{JointDriftItem, JointDriftList};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

/// Backing aggregate storage is missing or unusable.
#[derive(Debug)]
pub enum PersistenceError {
    /// The context has no aggregate collection.
    Uninitialized,
    /// The collection exists but holds no aggregate.
    NoAggregate,
    Db(DbError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "joint drift aggregate collection is not initialized"),
            Self::NoAggregate => write!(f, "no joint drift list found"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Uninitialized | Self::NoAggregate => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Unit-of-work over the aggregate collection.
pub trait PersistenceContext {
    /// Aggregate collection; `None` when the context is uninitialized.
    fn joint_drift_lists(&self) -> Option<&[JointDriftList]>;

    fn joint_drift_lists_mut(&mut self) -> Option<&mut Vec<JointDriftList>>;

    /// Commits the current state; returns the number of items written.
    fn save_changes(&mut self) -> Result<usize, PersistenceError>;
}

/// Context keeping committed state in memory.
///
/// `committed()` shows what the last successful save stored.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContext {
    lists: Option<Vec<JointDriftList>>,
    committed: Vec<JointDriftList>,
    save_count: usize,
}

impl InMemoryContext {
    /// Context holding one empty aggregate.
    pub fn new() -> Self {
        Self::with_lists(vec![JointDriftList::new()])
    }

    pub fn with_lists(lists: Vec<JointDriftList>) -> Self {
        Self {
            committed: lists.clone(),
            lists: Some(lists),
            save_count: 0,
        }
    }

    /// Context without an aggregate collection.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &[JointDriftList] {
        &self.committed
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl PersistenceContext for InMemoryContext {
    fn joint_drift_lists(&self) -> Option<&[JointDriftList]> {
        self.lists.as_deref()
    }

    fn joint_drift_lists_mut(&mut self) -> Option<&mut Vec<JointDriftList>> {
        self.lists.as_mut()
    }

    fn save_changes(&mut self) -> Result<usize, PersistenceError> {
        let lists = self.lists.as_ref().ok_or(PersistenceError::Uninitialized)?;
        self.committed = lists.clone();
        self.save_count += 1;
        Ok(lists.iter().map(JointDriftList::len).sum())
    }
}

/// Context backed by the SQLite application database.
pub struct SqliteContext {
    conn: Connection,
    lists: Vec<JointDriftList>,
}

impl SqliteContext {
    /// Opens the application database and loads every stored aggregate.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Loads aggregates from an already migrated connection.
    pub fn from_connection(conn: Connection) -> DbResult<Self> {
        let lists = load_lists(&conn)?;
        info!(
            "event=aggregate_load module=repo status=ok lists={} items={}",
            lists.len(),
            lists.iter().map(JointDriftList::len).sum::<usize>()
        );
        Ok(Self { conn, lists })
    }

    /// Returns the first aggregate, creating and persisting one if none exists.
    pub fn ensure_list(&mut self) -> Result<Uuid, PersistenceError> {
        if let Some(list) = self.lists.first() {
            return Ok(list.id());
        }
        let list = JointDriftList::new();
        let id = list.id();
        self.lists.push(list);
        self.save_changes()?;
        Ok(id)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PersistenceContext for SqliteContext {
    fn joint_drift_lists(&self) -> Option<&[JointDriftList]> {
        Some(&self.lists)
    }

    fn joint_drift_lists_mut(&mut self) -> Option<&mut Vec<JointDriftList>> {
        Some(&mut self.lists)
    }

    fn save_changes(&mut self) -> Result<usize, PersistenceError> {
        match write_lists(&mut self.conn, &self.lists) {
            Ok(written) => {
                info!(
                    "event=aggregate_save module=repo status=ok lists={} items={written}",
                    self.lists.len()
                );
                Ok(written)
            }
            Err(err) => {
                error!("event=aggregate_save module=repo status=error error={err}");
                Err(err.into())
            }
        }
    }
}

fn write_lists(conn: &mut Connection, lists: &[JointDriftList]) -> DbResult<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM joint_drift_items;", [])?;
    tx.execute("DELETE FROM joint_drift_lists;", [])?;

    let mut written = 0;
    {
        let mut insert_list =
            tx.prepare("INSERT INTO joint_drift_lists (id, ordinal) VALUES (?1, ?2);")?;
        let mut insert_item = tx.prepare(
            "INSERT INTO joint_drift_items (
                list_id, position, story, label, unique_name, output_case, case_type,
                step_type, step_number, step_label, disp_x, disp_y, drift_x, drift_y
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
        )?;

        for (ordinal, list) in lists.iter().enumerate() {
            let list_id = list.id().to_string();
            insert_list.execute(params![list_id, ordinal as i64])?;
            for (position, item) in list.items().iter().enumerate() {
                insert_item.execute(params![
                    list_id,
                    position as i64,
                    item.story,
                    item.label,
                    item.unique_name,
                    item.output_case,
                    item.case_type,
                    item.step_type,
                    item.step_number,
                    item.step_label,
                    item.disp_x,
                    item.disp_y,
                    item.drift_x,
                    item.drift_y,
                ])?;
                written += 1;
            }
        }
    }

    tx.commit()?;
    Ok(written)
}

fn load_lists(conn: &Connection) -> DbResult<Vec<JointDriftList>> {
    let mut list_stmt = conn.prepare("SELECT id FROM joint_drift_lists ORDER BY ordinal ASC;")?;
    let ids = list_stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut item_stmt = conn.prepare(
        "SELECT story, label, unique_name, output_case, case_type, step_type, step_number,
                step_label, disp_x, disp_y, drift_x, drift_y
         FROM joint_drift_items
         WHERE list_id = ?1
         ORDER BY position ASC;",
    )?;

    let mut lists = Vec::with_capacity(ids.len());
    for id_text in ids {
        let id = Uuid::parse_str(&id_text).map_err(|_| {
            DbError::InvalidData(format!("invalid uuid `{id_text}` in joint_drift_lists.id"))
        })?;
        let items = item_stmt
            .query_map([id_text.as_str()], parse_item_row)?
            .collect::<Result<Vec<_>, _>>()?;
        lists.push(JointDriftList::with_id(id, items));
    }
    Ok(lists)
}

fn parse_item_row(row: &Row<'_>) -> rusqlite::Result<JointDriftItem> {
    Ok(JointDriftItem {
        story: row.get("story")?,
        label: row.get("label")?,
        unique_name: row.get("unique_name")?,
        output_case: row.get("output_case")?,
        case_type: row.get("case_type")?,
        step_type: row.get("step_type")?,
        step_number: row.get("step_number")?,
        step_label: row.get("step_label")?,
        disp_x: row.get("disp_x")?,
        disp_y: row.get("disp_y")?,
        drift_x: row.get("drift_x")?,
        drift_y: row.get("drift_y")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{InMemoryContext, PersistenceContext, PersistenceError, SqliteContext};
    use crate::model::joint_drift::JointDriftItem;

    #[test]
    fn in_memory_save_commits_current_state() {
        let mut context = InMemoryContext::new();
        context.joint_drift_lists_mut().unwrap()[0]
            .push(JointDriftItem::new("L1", "7", "ELF X", 0.0));
        assert!(context.committed()[0].is_empty());

        assert_eq!(context.save_changes().unwrap(), 1);
        assert_eq!(context.committed()[0].len(), 1);
        assert_eq!(context.save_count(), 1);
    }

    #[test]
    fn uninitialized_context_rejects_save() {
        let mut context = InMemoryContext::uninitialized();
        assert!(context.joint_drift_lists().is_none());
        assert!(matches!(
            context.save_changes(),
            Err(PersistenceError::Uninitialized)
        ));
    }

    #[test]
    fn ensure_list_creates_one_aggregate_once() {
        let mut context = SqliteContext::open_in_memory().unwrap();
        let first = context.ensure_list().unwrap();
        let second = context.ensure_list().unwrap();
        assert_eq!(first, second);
        assert_eq!(context.joint_drift_lists().unwrap().len(), 1);
    }
}
