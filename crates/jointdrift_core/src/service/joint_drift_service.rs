//! Joint drift use-case service.
//!
//! # Responsibility
//! - Expose repository operations in transport shape.
//! - Translate empty results into `NotFound` where a result is required.
//!
//! # Invariants
//! - Adds no business rule beyond forwarding and shape conversion.
//! - Repository errors propagate unchanged in kind.

use crate::cancel::CancellationToken;
use crate::model::joint_drift::{JointDriftId, JointDriftItem};
use crate::repo::joint_drift_repo::{JointDriftRepository, NotFoundError, RepoResult};
use crate::service::dto::{to_dtos, JointDriftItemDto};
use log::info;
use uuid::Uuid;

/// Use-case service wrapper for joint drift data.
pub struct JointDriftService<R: JointDriftRepository> {
    repo: R,
}

impl<R: JointDriftRepository> JointDriftService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Returns every item of the write-side aggregate.
    pub fn get_all_items(&self) -> RepoResult<Vec<JointDriftItemDto>> {
        Ok(to_dtos(self.repo.get_all_items()?))
    }

    pub fn add_item(&mut self, item: JointDriftItemDto) -> RepoResult<()> {
        self.repo.add_item(item.into())
    }

    /// Adds a batch all-or-nothing.
    pub fn add_items(&mut self, items: Vec<JointDriftItemDto>) -> RepoResult<()> {
        self.repo
            .add_items(items.into_iter().map(JointDriftItem::from).collect())
    }

    pub fn get_items_by_ids(&self, ids: Vec<JointDriftId>) -> RepoResult<Vec<JointDriftItemDto>> {
        Ok(to_dtos(self.repo.get_items_by_ids(ids)?))
    }

    /// Discards the current aggregate and starts an empty one.
    pub fn reset(&mut self) -> RepoResult<Uuid> {
        self.repo.reset_aggregate()
    }

    pub fn get_unique_case_names(&self, cancel: &CancellationToken) -> RepoResult<Vec<String>> {
        self.repo.get_unique_case_names(cancel)
    }

    /// Returns the rows of one case; empty when the case is absent.
    pub fn get_entries_by_case(
        &self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<JointDriftItemDto>> {
        Ok(to_dtos(self.repo.get_entries_by_case(output_case, cancel)?))
    }

    /// Like `get_entries_by_case`, but an absent case is `NotFound`.
    pub fn require_entries_by_case(
        &self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<JointDriftItemDto>> {
        let entries = self.get_entries_by_case(output_case, cancel)?;
        if entries.is_empty() {
            return Err(NotFoundError::OutputCase(output_case.to_string()).into());
        }
        Ok(entries)
    }

    /// Returns the rows of one joint within one case; none is `NotFound`.
    pub fn find_entries_by_label(
        &self,
        output_case: &str,
        label: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<Vec<JointDriftItemDto>> {
        let entries: Vec<JointDriftItemDto> = self
            .get_entries_by_case(output_case, cancel)?
            .into_iter()
            .filter(|entry| entry.label == label)
            .collect();
        if entries.is_empty() {
            return Err(NotFoundError::Label {
                output_case: output_case.to_string(),
                label: label.to_string(),
            }
            .into());
        }
        Ok(entries)
    }

    /// Copies one legacy case into the write-side aggregate.
    ///
    /// Returns the number of imported items. The batch is validated as a
    /// whole; an invalid row imports nothing.
    pub fn import_case(
        &mut self,
        output_case: &str,
        cancel: &CancellationToken,
    ) -> RepoResult<usize> {
        let entries = self.repo.get_entries_by_case(output_case, cancel)?;
        if entries.is_empty() {
            return Err(NotFoundError::OutputCase(output_case.to_string()).into());
        }
        let count = entries.len();
        self.repo.add_items(entries)?;
        info!(
            "event=import_case module=service status=ok output_case=\"{output_case}\" items={count}"
        );
        Ok(count)
    }
}
