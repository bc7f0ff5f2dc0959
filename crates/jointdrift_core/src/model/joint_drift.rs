//! Joint drift record, identity and aggregate.
//!
//! # Responsibility
//! - Hold one measurement row exactly as exported (string labels,
//!   fractional step numbers).
//! - Provide structural identity over the four key fields.
//! - Own the ordered item sequence of one logical data set.
//!
//! # Invariants
//! - No single field of a record is unique on its own.
//! - `JointDriftList` preserves insertion order and does not reject
//!   duplicate identities on insertion.
//! - `JointDriftId` equality and hashing agree, including for `-0.0` and NaN
//!   step numbers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// One joint drift measurement sample.
///
/// Text cells that were NULL in the legacy store are carried as empty
/// strings; numeric NULL cells are carried as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointDriftItem {
    /// Building floor label, e.g. `L1`.
    pub story: String,
    /// Joint identifier as exported; not guaranteed numeric.
    pub label: String,
    pub unique_name: String,
    /// Analysis load-case name.
    pub output_case: String,
    pub case_type: String,
    pub step_type: String,
    /// Step position; may be fractional.
    pub step_number: f64,
    pub step_label: String,
    pub disp_x: f64,
    pub disp_y: f64,
    pub drift_x: f64,
    pub drift_y: f64,
}

impl JointDriftItem {
    /// Creates an item from its key fields; remaining fields take defaults.
    pub fn new(
        story: impl Into<String>,
        label: impl Into<String>,
        output_case: impl Into<String>,
        step_number: f64,
    ) -> Self {
        Self {
            story: story.into(),
            label: label.into(),
            output_case: output_case.into(),
            step_number,
            ..Self::default()
        }
    }

    /// Returns the composite identity of this record.
    pub fn id(&self) -> JointDriftId {
        JointDriftId::new(
            self.story.as_str(),
            self.label.as_str(),
            self.output_case.as_str(),
            self.step_number,
        )
    }
}

/// Value-equality key over `(story, label, output_case, step_number)`.
///
/// Displacement and drift values never take part in identity. No ordering
/// is defined.
#[derive(Debug, Clone)]
pub struct JointDriftId {
    story: String,
    label: String,
    output_case: String,
    step_number: f64,
}

impl JointDriftId {
    pub fn new(
        story: impl Into<String>,
        label: impl Into<String>,
        output_case: impl Into<String>,
        step_number: f64,
    ) -> Self {
        Self {
            story: story.into(),
            label: label.into(),
            output_case: output_case.into(),
            step_number,
        }
    }

    pub fn story(&self) -> &str {
        &self.story
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn output_case(&self) -> &str {
        &self.output_case
    }

    pub fn step_number(&self) -> f64 {
        self.step_number
    }

    fn step_key(&self) -> u64 {
        step_number_key(self.step_number)
    }
}

impl PartialEq for JointDriftId {
    fn eq(&self, other: &Self) -> bool {
        self.step_key() == other.step_key()
            && self.story == other.story
            && self.label == other.label
            && self.output_case == other.output_case
    }
}

impl Eq for JointDriftId {}

impl Hash for JointDriftId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.story.hash(state);
        self.label.hash(state);
        self.output_case.hash(state);
        self.step_key().hash(state);
    }
}

/// Bit pattern used for step-number equality.
///
/// `-0.0` folds onto `0.0` and every NaN folds onto one canonical NaN so that
/// `Eq` stays reflexive and consistent with `Hash`.
fn step_number_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// Aggregate root owning the ordered items of one data set.
#[derive(Debug, Clone, PartialEq)]
pub struct JointDriftList {
    id: Uuid,
    items: Vec<JointDriftItem>,
}

impl JointDriftList {
    /// Creates an empty aggregate with a generated stable ID.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4(), Vec::new())
    }

    /// Rebuilds an aggregate from persisted state.
    pub fn with_id(id: Uuid, items: Vec<JointDriftItem>) -> Self {
        Self { id, items }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[JointDriftItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends one item. Duplicate identities are accepted.
    pub fn push(&mut self, item: JointDriftItem) {
        self.items.push(item);
    }

    /// Appends items preserving their order.
    pub fn extend(&mut self, items: impl IntoIterator<Item = JointDriftItem>) {
        self.items.extend(items);
    }

    /// Drops items appended after `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Returns whether any item carries `id`.
    pub fn contains_id(&self, id: &JointDriftId) -> bool {
        self.items.iter().any(|item| &item.id() == id)
    }

    /// Returns every item whose identity is in `ids`, in list order.
    ///
    /// Items sharing one identity are all returned.
    pub fn get_items_by_ids<I>(&self, ids: I) -> Vec<&JointDriftItem>
    where
        I: IntoIterator<Item = JointDriftId>,
    {
        let wanted: HashSet<JointDriftId> = ids.into_iter().collect();
        if wanted.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| wanted.contains(&item.id()))
            .collect()
    }
}

impl Default for JointDriftList {
    fn default() -> Self {
        Self::new()
    }
}
