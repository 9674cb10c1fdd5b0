use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per day figures derived from queue entries. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_processed: u32,
    pub special_requests: u32,
    pub knock_offs: u32,
    /// Minutes from arrival to the start of loading.
    pub average_wait_time: f64,
}

impl DailyStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_processed: 0,
            special_requests: 0,
            knock_offs: 0,
            average_wait_time: 0.0,
        }
    }
}
