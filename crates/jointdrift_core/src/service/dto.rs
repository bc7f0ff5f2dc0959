//! Transport shape for joint drift records.

use crate::model::joint_drift::JointDriftItem;
use serde::{Deserialize, Serialize};

/// Joint drift record as exchanged with callers outside core.
///
/// Serialized with camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointDriftItemDto {
    pub story: String,
    pub label: String,
    pub unique_name: String,
    pub output_case: String,
    pub case_type: String,
    pub step_type: String,
    pub step_number: f64,
    pub step_label: String,
    pub disp_x: f64,
    pub disp_y: f64,
    pub drift_x: f64,
    pub drift_y: f64,
}

impl From<&JointDriftItem> for JointDriftItemDto {
    fn from(item: &JointDriftItem) -> Self {
        item.clone().into()
    }
}

impl From<JointDriftItem> for JointDriftItemDto {
    fn from(item: JointDriftItem) -> Self {
        Self {
            story: item.story,
            label: item.label,
            unique_name: item.unique_name,
            output_case: item.output_case,
            case_type: item.case_type,
            step_type: item.step_type,
            step_number: item.step_number,
            step_label: item.step_label,
            disp_x: item.disp_x,
            disp_y: item.disp_y,
            drift_x: item.drift_x,
            drift_y: item.drift_y,
        }
    }
}

impl From<JointDriftItemDto> for JointDriftItem {
    fn from(dto: JointDriftItemDto) -> Self {
        Self {
            story: dto.story,
            label: dto.label,
            unique_name: dto.unique_name,
            output_case: dto.output_case,
            case_type: dto.case_type,
            step_type: dto.step_type,
            step_number: dto.step_number,
            step_label: dto.step_label,
            disp_x: dto.disp_x,
            disp_y: dto.disp_y,
            drift_x: dto.drift_x,
            drift_y: dto.drift_y,
        }
    }
}

/// Maps records to transport shape, keeping order.
pub fn to_dtos(items: Vec<JointDriftItem>) -> Vec<JointDriftItemDto> {
    items.into_iter().map(JointDriftItemDto::from).collect()
}
