use chrono::{DateTime, Local, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{station::Station, user::User};

/// The record that grants a user authority over the queues of its stations.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorProfile {
    pub user: Id<User>,
    pub stations: Vec<Id<Station>>,
    pub specializations: Vec<String>,
    pub working_hours: Option<WorkingHours>,
    pub rating: f64,
    /// Years of experience.
    pub experience: u32,
    pub created_at: DateTime<Local>,
}

impl HasId for CoordinatorProfile {
    type IdType = String;
}

impl CoordinatorProfile {
    pub fn administers(&self, station: &Id<Station>) -> bool {
        self.stations.contains(station)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    #[serde(with = "utility::serde::hour_minute")]
    #[schemars(schema_with = "utility::serde::hour_minute::schema")]
    pub start: NaiveTime,
    #[serde(with = "utility::serde::hour_minute")]
    #[schemars(schema_with = "utility::serde::hour_minute::schema")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorRegistration {
    #[serde(default)]
    pub specializations: Vec<String>,
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub experience: u32,
}
