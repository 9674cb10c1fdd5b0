use std::{fmt, str::FromStr};

use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{station::Station, user::User, ExampleData, WithId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Combi,
    Taxi,
    Bus,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Combi => "combi",
            Self::Taxi => "taxi",
            Self::Bus => "bus",
        }
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combi" => Ok(Self::Combi),
            "taxi" => Ok(Self::Taxi),
            "bus" => Ok(Self::Bus),
            other => Err(format!("unknown service type `{}`", other)),
        }
    }
}

/// Lifecycle state of a queue entry.
///
/// `Loaded` and `KnockedOff` are terminal. Only `Waiting` entries hold a
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Loading,
    Loaded,
    KnockedOff,
    Special,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 5] = [
        Self::Waiting,
        Self::Loading,
        Self::Loaded,
        Self::KnockedOff,
        Self::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::KnockedOff => "knocked_off",
            Self::Special => "special",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded | Self::KnockedOff)
    }

    /// Entries that still occupy the station.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown queue status `{}`", s))
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub station_id: Id<Station>,
    /// The driver who joined. `None` for vehicles a coordinator queued on
    /// behalf of a walk-up operator.
    pub owner: Option<Id<User>>,
    pub operator_name: String,
    pub vehicle_number: String,
    pub route: String,
    pub destination: String,
    pub capacity: u32,
    pub service_type: ServiceType,
    pub status: QueueStatus,
    pub position: Option<u32>,
    pub arrival_time: DateTime<Local>,
    pub loading_start_time: Option<DateTime<Local>>,
    pub loading_end_time: Option<DateTime<Local>>,
    pub departure_time: Option<DateTime<Local>>,
    pub knock_off_time: Option<DateTime<Local>>,
    pub knock_off_reason: Option<String>,
    pub special_request: bool,
    pub special_request_time: Option<DateTime<Local>>,
    pub contact_number: Option<String>,
    pub archived: bool,
}

impl HasId for QueueEntry {
    type IdType = String;
}

impl QueueEntry {
    /// The moment the entry reached its terminal state.
    pub fn terminal_time(&self) -> Option<DateTime<Local>> {
        match self.status {
            QueueStatus::Loaded => self.departure_time.or(self.loading_end_time),
            QueueStatus::KnockedOff => self.knock_off_time,
            _ => None,
        }
    }

    pub fn is_owned_by(&self, user: &Id<User>) -> bool {
        self.owner.as_ref() == Some(user)
    }

    pub fn is_same_vehicle(&self, vehicle_number: &str) -> bool {
        normalize_vehicle_number(&self.vehicle_number)
            == normalize_vehicle_number(vehicle_number)
    }
}

/// Registration plates are compared without whitespace and case.
pub fn normalize_vehicle_number(vehicle_number: &str) -> String {
    vehicle_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

impl ExampleData for QueueEntry {
    fn example_data() -> Self {
        Self {
            station_id: Id::new("0b1f7a4c-3c2e-4d8a-8f5e-6c1d2e3f4a5b".to_owned()),
            owner: Some(Id::new("driver-42".to_owned())),
            operator_name: "Kgosi Transport".to_owned(),
            vehicle_number: "B123ABC".to_owned(),
            route: "Gaborone - Mogoditshane".to_owned(),
            destination: "Mogoditshane".to_owned(),
            capacity: 15,
            service_type: ServiceType::Combi,
            status: QueueStatus::Waiting,
            position: Some(1),
            arrival_time: Local::now(),
            loading_start_time: None,
            loading_end_time: None,
            departure_time: None,
            knock_off_time: None,
            knock_off_reason: None,
            special_request: false,
            special_request_time: None,
            contact_number: Some("+267 71 234 567".to_owned()),
            archived: false,
        }
    }
}

/// Vehicle data as submitted when joining or adding to a queue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewQueueEntry {
    #[serde(default)]
    pub operator_name: String,
    pub vehicle_number: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub destination: String,
    pub capacity: u32,
    pub service_type: ServiceType,
    pub contact_number: Option<String>,
    /// Defaults to the time of the request.
    #[serde(
        default,
        deserialize_with = "utility::serde::date_time::deserialize_local_option"
    )]
    pub arrival_time: Option<DateTime<Local>>,
    /// New entries always start out `waiting`. Anything else is rejected.
    pub status: Option<QueueStatus>,
    #[serde(default, alias = "specialService")]
    pub special_request: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// The queue of one station, partitioned for display.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub station: WithId<Station>,
    /// Ordered by position.
    pub waiting: Vec<WithId<QueueEntry>>,
    pub special: Vec<WithId<QueueEntry>>,
    pub loading: Vec<WithId<QueueEntry>>,
    /// Today's loaded and knocked off entries, most recent first.
    pub completed: Vec<WithId<QueueEntry>>,
    pub generated_at: DateTime<Local>,
}

impl QueueSnapshot {
    /// All entries in display order.
    pub fn into_entries(self) -> Vec<WithId<QueueEntry>> {
        let mut entries = self.waiting;
        entries.extend(self.special);
        entries.extend(self.loading);
        entries.extend(self.completed);
        entries
    }
}

/// A driver's view of one of their active entries.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverQueueStatus {
    pub station_name: String,
    /// Whether the station is within its operating hours right now.
    pub station_open: bool,
    pub entry: WithId<QueueEntry>,
    /// Number of waiting vehicles in front. `None` when not waiting.
    pub vehicles_ahead: Option<u32>,
    pub queue_length: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in QueueStatus::ALL {
            assert_eq!(status.as_str().parse::<QueueStatus>(), Ok(status));
        }
        assert!("parked".parse::<QueueStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&QueueStatus::KnockedOff).unwrap(),
            "\"knocked_off\""
        );
    }

    #[test]
    fn terminal_and_active_are_complementary() {
        for status in QueueStatus::ALL {
            assert_ne!(status.is_terminal(), status.is_active());
        }
        assert!(QueueStatus::Special.is_active());
    }

    #[test]
    fn vehicle_numbers_compare_normalized() {
        assert_eq!(normalize_vehicle_number(" b123 abc "), "B123ABC");
        let entry = QueueEntry::example_data();
        assert!(entry.is_same_vehicle("b 123 abc"));
        assert!(!entry.is_same_vehicle("B124ABC"));
    }

    #[test]
    fn entry_json_uses_camel_case_and_skips_empty_fields() {
        let json = serde_json::to_value(QueueEntry::example_data()).unwrap();
        assert_eq!(json["vehicleNumber"], "B123ABC");
        assert_eq!(json["serviceType"], "combi");
        assert!(json.get("knockOffReason").is_none());
    }

    #[test]
    fn new_entry_accepts_minimal_join_body() {
        let entry: NewQueueEntry = serde_json::from_str(
            r#"{"vehicleNumber":"B123ABC","capacity":15,"serviceType":"taxi"}"#,
        )
        .unwrap();
        assert_eq!(entry.service_type, ServiceType::Taxi);
        assert!(!entry.special_request);
        assert!(entry.arrival_time.is_none());
    }

    #[test]
    fn join_body_accepts_special_service_flag() {
        let entry: NewQueueEntry = serde_json::from_str(
            r#"{"vehicleNumber":"B1","capacity":4,"serviceType":"bus","specialService":true}"#,
        )
        .unwrap();
        assert!(entry.special_request);
        assert!(entry.arrival_time.is_none());
    }

    #[test]
    fn arrival_time_accepts_browser_timestamps() {
        let entry: NewQueueEntry = serde_json::from_str(
            r#"{"vehicleNumber":"B1","capacity":4,"serviceType":"bus","arrivalTime":"2024-05-01T06:30:00.000Z"}"#,
        )
        .unwrap();
        assert!(entry.arrival_time.is_some());

        let blank: NewQueueEntry = serde_json::from_str(
            r#"{"vehicleNumber":"B1","capacity":4,"serviceType":"bus","arrivalTime":""}"#,
        )
        .unwrap();
        assert!(blank.arrival_time.is_none());
    }
}
