//! Joint drift repository contracts and implementations.
//!
//! # Responsibility
//! - Write path: validate records, append them to the aggregate, persist.
//! - Read path: case discovery and case-filtered fetch from the legacy store.
//! - Compose both paths behind one contract for the service layer.
//!
//! # Invariants
//! - Write paths validate before any mutation.
//! - A batch is appended and persisted entirely or not at all.
//! - A failed save leaves the in-memory aggregate at its pre-call length.
//! - Read-path absence of rows is an empty vector, not an error.

use crate::cancel::CancellationToken;
use crate::legacy::connection::LegacyConnectionProvider;
use crate::legacy::reader::{ImportError, JointDriftImportReader};
use crate::model::joint_drift::{JointDriftId, JointDriftItem, JointDriftList};
use crate::model::validation::{validate_item, validate_items, ValidationError, ValidationRules};
use crate::repo::context::{PersistenceContext, PersistenceError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// A required result does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    OutputCase(String),
    Label { output_case: String, label: String },
}

impl Display for NotFoundError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutputCase(output_case) => write!(
                f,
                "unable to find joint drift items with output case: {output_case}"
            ),
            Self::Label { output_case, label } => write!(
                f,
                "unable to find joint drift items with label: {label} (output case: {output_case})"
            ),
        }
    }
}

impl Error for NotFoundError {}

/// Repository-level error for joint drift operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Import(ImportError),
    Persistence(PersistenceError),
    NotFound(NotFoundError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::NotFound(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::NotFound(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ImportError> for RepoError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<PersistenceError> for RepoError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<NotFoundError> for RepoError {
    fn from(value: NotFoundError) -> Self {
        Self::NotFound(value)
    }
}

/// Validate-and-persist contract over the write-side aggregate.
pub trait JointDriftWriteRepository {
    fn add_item(&mut self, item: JointDriftItem) -> RepoResult<()>;
    fn add_items(&mut self, items: Vec<JointDriftItem>) -> RepoResult<()>;
    fn get_all_items(&self) -> RepoResult<Vec<JointDriftItem>>;
    fn get_items_by_ids(&self, ids: Vec<JointDriftId>) -> RepoResult<Vec<JointDriftItem>>;
    /// Replaces the aggregate with a new empty one; returns the new list ID.
    fn reset_aggregate(&mut self) -> RepoResult<Uuid>;
}

/// Read-only case queries against the legacy store.
pub trait JointDriftCaseRepository {
    fn get_unique_case_names(&self, cancel: &CancellationToken) -> RepoResult<Vec<String>>;
    fn get_entries_by_case(
        &self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<JointDriftItem>>;
}

/// Unified repository contract consumed by the service layer.
pub trait JointDriftRepository: JointDriftWriteRepository + JointDriftCaseRepository {}

impl<T: JointDriftWriteRepository + JointDriftCaseRepository> JointDriftRepository for T {}

/// Write-side repository over a persistence context.
pub struct AggregateJointDriftRepository<C: PersistenceContext> {
    context: C,
    rules: ValidationRules,
}

impl<C: PersistenceContext> AggregateJointDriftRepository<C> {
    pub fn new(context: C) -> Self {
        Self::with_rules(context, ValidationRules::default())
    }

    pub fn with_rules(context: C, rules: ValidationRules) -> Self {
        Self { context, rules }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    fn current_list(&self) -> Option<&JointDriftList> {
        self.context.joint_drift_lists()?.first()
    }

    fn current_list_mut(&mut self) -> Result<&mut JointDriftList, PersistenceError> {
        self.context
            .joint_drift_lists_mut()
            .ok_or(PersistenceError::Uninitialized)?
            .first_mut()
            .ok_or(PersistenceError::NoAggregate)
    }

    /// Saves, or trims items appended since `previous_len` when saving fails.
    fn save_or_trim(&mut self, previous_len: usize) -> RepoResult<usize> {
        match self.context.save_changes() {
            Ok(written) => Ok(written),
            Err(err) => {
                if let Ok(list) = self.current_list_mut() {
                    list.truncate(previous_len);
                }
                Err(err.into())
            }
        }
    }
}

impl<C: PersistenceContext> JointDriftWriteRepository for AggregateJointDriftRepository<C> {
    fn add_item(&mut self, item: JointDriftItem) -> RepoResult<()> {
        if let Err(err) = validate_item(&item, self.rules) {
            warn!(
                "event=add_item module=repo status=rejected failures={}",
                err.failures().len()
            );
            return Err(err.into());
        }

        let list = self.current_list_mut()?;
        let previous_len = list.len();
        list.push(item);
        self.save_or_trim(previous_len)?;

        info!("event=add_item module=repo status=ok list_len={}", previous_len + 1);
        Ok(())
    }

    fn add_items(&mut self, items: Vec<JointDriftItem>) -> RepoResult<()> {
        if let Err(err) = validate_items(&items, self.rules) {
            warn!(
                "event=add_items module=repo status=rejected batch_size={} failed_items={} failures={}",
                items.len(),
                err.failed_indexes().len(),
                err.failures().len()
            );
            return Err(err.into());
        }

        let batch_size = items.len();
        let list = self.current_list_mut()?;
        let previous_len = list.len();
        list.extend(items);
        self.save_or_trim(previous_len)?;

        info!(
            "event=add_items module=repo status=ok batch_size={batch_size} list_len={}",
            previous_len + batch_size
        );
        Ok(())
    }

    fn get_all_items(&self) -> RepoResult<Vec<JointDriftItem>> {
        Ok(self
            .current_list()
            .map(|list| list.items().to_vec())
            .unwrap_or_default())
    }

    fn get_items_by_ids(&self, ids: Vec<JointDriftId>) -> RepoResult<Vec<JointDriftItem>> {
        Ok(self
            .current_list()
            .map(|list| list.get_items_by_ids(ids).into_iter().cloned().collect())
            .unwrap_or_default())
    }

    fn reset_aggregate(&mut self) -> RepoResult<Uuid> {
        let fresh = JointDriftList::new();
        let id = fresh.id();
        let lists = self
            .context
            .joint_drift_lists_mut()
            .ok_or(PersistenceError::Uninitialized)?;
        let previous = if lists.is_empty() {
            lists.push(fresh);
            None
        } else {
            Some(std::mem::replace(&mut lists[0], fresh))
        };

        if let Err(err) = self.context.save_changes() {
            if let Some(lists) = self.context.joint_drift_lists_mut() {
                match previous {
                    Some(previous) => lists[0] = previous,
                    None => {
                        lists.remove(0);
                    }
                }
            }
            return Err(err.into());
        }

        info!("event=reset_aggregate module=repo status=ok list_id={id}");
        Ok(id)
    }
}

/// Read-side repository over the legacy store.
pub struct LegacyJointDriftRepository<'p> {
    reader: JointDriftImportReader<'p>,
}

impl<'p> LegacyJointDriftRepository<'p> {
    pub fn new(provider: &'p LegacyConnectionProvider) -> Self {
        Self {
            reader: JointDriftImportReader::new(provider),
        }
    }
}

impl JointDriftCaseRepository for LegacyJointDriftRepository<'_> {
    fn get_unique_case_names(&self, cancel: &CancellationToken) -> RepoResult<Vec<String>> {
        Ok(self.reader.unique_case_names(cancel)?)
    }

    fn get_entries_by_case(
        &self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<JointDriftItem>> {
        Ok(self.reader.entries_by_case(output_case, cancel)?)
    }
}

/// Write path and read path behind one value.
pub struct CombinedJointDriftRepository<'p, C: PersistenceContext> {
    writer: AggregateJointDriftRepository<C>,
    reader: LegacyJointDriftRepository<'p>,
}

impl<'p, C: PersistenceContext> CombinedJointDriftRepository<'p, C> {
    pub fn new(
        writer: AggregateJointDriftRepository<C>,
        reader: LegacyJointDriftRepository<'p>,
    ) -> Self {
        Self { writer, reader }
    }

    pub fn writer(&self) -> &AggregateJointDriftRepository<C> {
        &self.writer
    }
}

impl<C: PersistenceContext> JointDriftWriteRepository for CombinedJointDriftRepository<'_, C> {
    fn add_item(&mut self, item: JointDriftItem) -> RepoResult<()> {
        self.writer.add_item(item)
    }

    fn add_items(&mut self, items: Vec<JointDriftItem>) -> RepoResult<()> {
        self.writer.add_items(items)
    }

    fn get_all_items(&self) -> RepoResult<Vec<JointDriftItem>> {
        self.writer.get_all_items()
    }

    fn get_items_by_ids(&self, ids: Vec<JointDriftId>) -> RepoResult<Vec<JointDriftItem>> {
        self.writer.get_items_by_ids(ids)
    }

    fn reset_aggregate(&mut self) -> RepoResult<Uuid> {
        self.writer.reset_aggregate()
    }
}

impl<C: PersistenceContext> JointDriftCaseRepository for CombinedJointDriftRepository<'_, C> {
    fn get_unique_case_names(&self, cancel: &CancellationToken) -> RepoResult<Vec<String>> {
        self.reader.get_unique_case_names(cancel)
    }

    fn get_entries_by_case(
        &self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<JointDriftItem>> {
        self.reader.get_entries_by_case(output_case, cancel)
    }
}
