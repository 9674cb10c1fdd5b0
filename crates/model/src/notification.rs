use std::{fmt, str::FromStr};

use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{queue::QueueEntry, station::Station, user::User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    PositionChanged,
    LoadingStarted,
    Loaded,
    KnockedOff,
    SpecialGranted,
    Removed,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 6] = [
        Self::PositionChanged,
        Self::LoadingStarted,
        Self::Loaded,
        Self::KnockedOff,
        Self::SpecialGranted,
        Self::Removed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PositionChanged => "positionChanged",
            Self::LoadingStarted => "loadingStarted",
            Self::Loaded => "loaded",
            Self::KnockedOff => "knockedOff",
            Self::SpecialGranted => "specialGranted",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown notification kind `{}`", s))
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: Id<User>,
    pub station_id: Option<Id<Station>>,
    pub entry_id: Option<Id<QueueEntry>>,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Local>,
}

impl HasId for Notification {
    type IdType = String;
}
