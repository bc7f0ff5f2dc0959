//! Business-rule checks for joint drift records.
//!
//! # Responsibility
//! - Check one record against storage-independent rules.
//! - Aggregate failures per field so callers can report all of them at once.
//!
//! # Invariants
//! - Validation is pure: no I/O, no mutation.
//! - A result is either success or a non-empty failure list, never both.

use crate::model::joint_drift::JointDriftItem;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FIELD_STORY: &str = "story";
pub const FIELD_LABEL: &str = "label";
pub const FIELD_OUTPUT_CASE: &str = "outputCase";
pub const FIELD_STEP_NUMBER: &str = "stepNumber";
pub const FIELD_DISP_X: &str = "dispX";
pub const FIELD_DISP_Y: &str = "dispY";
pub const FIELD_DRIFT_X: &str = "driftX";
pub const FIELD_DRIFT_Y: &str = "driftY";

/// Rule switches for record validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Legacy numeric-label rule: `label` must parse as an integer `> 0`.
    ///
    /// Off by default; exports carry free-form joint labels.
    pub numeric_labels: bool,
}

/// One failed rule for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Position inside a batch; `None` for single-item validation.
    pub item_index: Option<usize>,
    pub field: &'static str,
    pub message: String,
}

/// One or more rule failures across one or more records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    failures: Vec<ValidationFailure>,
}

impl ValidationError {
    /// Builds an error from collected failures; `None` when nothing failed.
    pub fn from_failures(failures: Vec<ValidationFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Groups failure messages by field name.
    pub fn errors(&self) -> BTreeMap<&'static str, Vec<&str>> {
        let mut grouped: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for failure in &self.failures {
            grouped
                .entry(failure.field)
                .or_default()
                .push(failure.message.as_str());
        }
        grouped
    }

    /// Returns whether any failure is keyed by `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.failures.iter().any(|failure| failure.field == field)
    }

    /// Distinct batch positions that failed, ascending.
    pub fn failed_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self
            .failures
            .iter()
            .filter_map(|failure| failure.item_index)
            .collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "one or more validation failures have occurred:")?;
        for failure in &self.failures {
            match failure.item_index {
                Some(index) => write!(
                    f,
                    " [item {index}] {}: {};",
                    failure.field, failure.message
                )?,
                None => write!(f, " {}: {};", failure.field, failure.message)?,
            }
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Validates one record.
pub fn validate_item(item: &JointDriftItem, rules: ValidationRules) -> Result<(), ValidationError> {
    let mut failures = Vec::new();
    collect_failures(item, rules, None, &mut failures);
    match ValidationError::from_failures(failures) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Validates every record of a batch and reports all failures together.
///
/// Each failure carries the position of its record inside `items`.
pub fn validate_items(
    items: &[JointDriftItem],
    rules: ValidationRules,
) -> Result<(), ValidationError> {
    let mut failures = Vec::new();
    for (index, item) in items.iter().enumerate() {
        collect_failures(item, rules, Some(index), &mut failures);
    }
    match ValidationError::from_failures(failures) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn collect_failures(
    item: &JointDriftItem,
    rules: ValidationRules,
    item_index: Option<usize>,
    failures: &mut Vec<ValidationFailure>,
) {
    let mut fail = |field: &'static str, message: String| {
        failures.push(ValidationFailure {
            item_index,
            field,
            message,
        });
    };

    if is_blank(&item.label) {
        fail(FIELD_LABEL, "'label' must not be empty.".to_string());
    } else if rules.numeric_labels {
        match item.label.trim().parse::<i64>() {
            Ok(value) if value > 0 => {}
            Ok(_) => fail(FIELD_LABEL, "'label' must be greater than '0'.".to_string()),
            Err(_) => fail(
                FIELD_LABEL,
                format!("'label' must be an integer, got `{}`.", item.label),
            ),
        }
    }

    // NaN compares false and is rejected here.
    if !(item.step_number >= 0.0) {
        fail(
            FIELD_STEP_NUMBER,
            format!(
                "'stepNumber' must be greater than or equal to '0', got `{}`.",
                item.step_number
            ),
        );
    }

    for (field, value) in [
        (FIELD_DISP_X, item.disp_x),
        (FIELD_DISP_Y, item.disp_y),
        (FIELD_DRIFT_X, item.drift_x),
        (FIELD_DRIFT_Y, item.drift_y),
    ] {
        if !value.is_finite() {
            fail(field, format!("'{field}' must be a finite number, got `{value}`."));
        }
    }

    if is_blank(&item.story) {
        fail(FIELD_STORY, "'story' must not be empty.".to_string());
    }

    if is_blank(&item.output_case) {
        fail(FIELD_OUTPUT_CASE, "'outputCase' must not be empty.".to_string());
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::{
        validate_item, validate_items, ValidationRules, FIELD_DISP_Y, FIELD_DRIFT_X,
        FIELD_LABEL, FIELD_OUTPUT_CASE, FIELD_STEP_NUMBER, FIELD_STORY,
    };
    use crate::model::joint_drift::JointDriftItem;

    fn valid_item() -> JointDriftItem {
        JointDriftItem::new("L1", "7", "ELF X", 0.0)
    }

    #[test]
    fn fully_valid_item_passes() {
        validate_item(&valid_item(), ValidationRules::default()).unwrap();
    }

    #[test]
    fn empty_story_fails_on_story() {
        let item = JointDriftItem::new("", "7", "ELF X", 0.0);
        let err = validate_item(&item, ValidationRules::default()).unwrap_err();
        assert!(err.has_field(FIELD_STORY));
        assert_eq!(err.failures().len(), 1);
    }

    #[test]
    fn negative_step_number_fails_on_step_number() {
        let item = JointDriftItem::new("L1", "7", "ELF X", -1.0);
        let err = validate_item(&item, ValidationRules::default()).unwrap_err();
        assert!(err.has_field(FIELD_STEP_NUMBER));
        assert!(!err.has_field(FIELD_STORY));
    }

    #[test]
    fn nan_step_number_is_rejected() {
        let item = JointDriftItem::new("L1", "7", "ELF X", f64::NAN);
        let err = validate_item(&item, ValidationRules::default()).unwrap_err();
        assert!(err.has_field(FIELD_STEP_NUMBER));
    }

    #[test]
    fn non_finite_measurements_are_rejected() {
        let mut item = valid_item();
        item.disp_y = f64::NAN;
        item.drift_x = f64::INFINITY;
        let err = validate_item(&item, ValidationRules::default()).unwrap_err();
        assert!(err.has_field(FIELD_DISP_Y));
        assert!(err.has_field(FIELD_DRIFT_X));
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn whitespace_only_text_counts_as_empty() {
        let item = JointDriftItem::new("  ", " ", "\t", 2.0);
        let err = validate_item(&item, ValidationRules::default()).unwrap_err();
        let errors = err.errors();
        assert!(errors.contains_key(FIELD_STORY));
        assert!(errors.contains_key(FIELD_LABEL));
        assert!(errors.contains_key(FIELD_OUTPUT_CASE));
    }

    #[test]
    fn free_form_label_passes_without_numeric_rule() {
        let item = JointDriftItem::new("L1", "J-12a", "ELF X", 0.5);
        validate_item(&item, ValidationRules::default()).unwrap();
    }

    #[test]
    fn numeric_label_rule_requires_positive_integer() {
        let rules = ValidationRules {
            numeric_labels: true,
        };
        validate_item(&JointDriftItem::new("L1", "12", "ELF X", 0.0), rules).unwrap();

        let zero = validate_item(&JointDriftItem::new("L1", "0", "ELF X", 0.0), rules)
            .unwrap_err();
        assert!(zero.has_field(FIELD_LABEL));

        let text = validate_item(&JointDriftItem::new("L1", "J-1", "ELF X", 0.0), rules)
            .unwrap_err();
        assert!(text.has_field(FIELD_LABEL));
    }

    #[test]
    fn batch_validation_reports_failing_positions_only() {
        let items = vec![
            valid_item(),
            JointDriftItem::new("", "7", "ELF X", -1.0),
            valid_item(),
        ];
        let err = validate_items(&items, ValidationRules::default()).unwrap_err();
        assert_eq!(err.failed_indexes(), vec![1]);
        assert_eq!(err.failures().len(), 2);
    }
}
