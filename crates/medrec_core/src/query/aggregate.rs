//! Condition statistics pipeline.
//!
//! # Responsibility
//! - Define the group-by-condition, count, sort-descending pipeline.
//! - Shape store group rows into `StatRow` results.
//!
//! # Invariants
//! - Output is ordered by `count` descending.
//! - Order among equal counts is unspecified.

use crate::model::patient::PatientField;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// One aggregation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `{"$group": {"_id": "$<key>", "count": {"$sum": 1}}}`
    GroupCount { key: PatientField },
    /// `{"$sort": {"count": -1 | 1}}`
    SortByCount { descending: bool },
}

impl Stage {
    pub fn to_document(&self) -> JsonValue {
        match self {
            Self::GroupCount { key } => json!({
                "$group": {
                    "_id": format!("${}", key.as_str()),
                    "count": { "$sum": 1 },
                }
            }),
            Self::SortByCount { descending } => {
                json!({ "$sort": { "count": if *descending { -1 } else { 1 } } })
            }
        }
    }
}

/// Ordered list of aggregation stages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn to_document(&self) -> JsonValue {
        JsonValue::Array(self.stages.iter().map(Stage::to_document).collect())
    }
}

/// Group row returned by the store for a `GroupCount` pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: String,
    pub count: u64,
}

/// Per-condition patient count. Serializes as `{"_id": condition, "count": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatRow {
    #[serde(rename = "_id")]
    pub condition: String,
    pub count: u64,
}

impl From<GroupCount> for StatRow {
    fn from(value: GroupCount) -> Self {
        Self {
            condition: value.key,
            count: value.count,
        }
    }
}

/// Group by `condition`, then sort by member count descending.
pub fn condition_stats_pipeline() -> Pipeline {
    Pipeline {
        stages: vec![
            Stage::GroupCount {
                key: PatientField::Condition,
            },
            Stage::SortByCount { descending: true },
        ],
    }
}

/// Converts store rows into stats rows, keeping store order.
pub fn stat_rows(groups: Vec<GroupCount>) -> Vec<StatRow> {
    groups.into_iter().map(StatRow::from).collect()
}
