use chrono::{DateTime, Datelike, Local, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::ExampleData;

/// A rank where combis, taxis and buses queue for passengers.
///
/// Stations are never deleted. A station that is no longer served is
/// deactivated so historical queue entries keep a valid reference.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub name: String,
    pub address: String,
    pub city: String,
    /// Number of waiting bays.
    pub capacity: u32,
    pub operating_hours: OperatingHours,
    pub is_active: bool,
    pub created_at: DateTime<Local>,
}

impl HasId for Station {
    type IdType = String;
}

impl Station {
    pub fn is_open_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        self.operating_hours.is_open_at(at.naive_local())
    }
}

impl ExampleData for Station {
    fn example_data() -> Self {
        Self {
            name: "Gaborone Bus Rank".to_owned(),
            address: "Old Lobatse Road".to_owned(),
            city: "Gaborone".to_owned(),
            capacity: 40,
            operating_hours: OperatingHours::default(),
            is_active: true,
            created_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    #[serde(with = "utility::serde::hour_minute")]
    #[schemars(schema_with = "utility::serde::hour_minute::schema")]
    pub open: NaiveTime,
    #[serde(with = "utility::serde::hour_minute")]
    #[schemars(schema_with = "utility::serde::hour_minute::schema")]
    pub close: NaiveTime,
    #[serde(default)]
    pub closed: bool,
}

impl DayHours {
    pub fn open(open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            open,
            close,
            closed: false,
        }
    }

    pub fn closed() -> Self {
        Self {
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            closed: true,
        }
    }

    fn runs_past_midnight(&self) -> bool {
        self.close < self.open
    }

    /// Whether `time` lies in the part of this day's opening that starts on
    /// the day itself. `open == close` means open around the clock.
    fn covers_same_day(&self, time: NaiveTime) -> bool {
        if self.closed {
            false
        } else if self.open == self.close {
            true
        } else if self.runs_past_midnight() {
            time >= self.open
        } else {
            time >= self.open && time < self.close
        }
    }

    /// Whether `time` on the following day is still covered by this opening.
    fn covers_next_morning(&self, time: NaiveTime) -> bool {
        !self.closed && self.runs_past_midnight() && time < self.close
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

impl OperatingHours {
    pub fn every_day(hours: DayHours) -> Self {
        Self {
            monday: hours,
            tuesday: hours,
            wednesday: hours,
            thursday: hours,
            friday: hours,
            saturday: hours,
            sunday: hours,
        }
    }

    pub fn day(&self, weekday: Weekday) -> &DayHours {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let weekday = at.weekday();
        let time = at.time();
        self.day(weekday).covers_same_day(time)
            || self.day(weekday.pred()).covers_next_morning(time)
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self::every_day(DayHours::open(
            NaiveTime::from_hms_opt(5, 0, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
        ))
    }
}

/// Payload to register a new station.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStation {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    pub capacity: u32,
    pub operating_hours: Option<OperatingHours>,
}

/// Partial update of a station. Absent fields stay untouched.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<u32>,
    pub operating_hours: Option<OperatingHours>,
    pub is_active: Option<bool>,
}

impl StationPatch {
    pub fn apply(self, station: &mut Station) {
        if let Some(name) = self.name {
            station.name = name.trim().to_owned();
        }
        if let Some(address) = self.address {
            station.address = address;
        }
        if let Some(city) = self.city {
            station.city = city;
        }
        if let Some(capacity) = self.capacity {
            station.capacity = capacity;
        }
        if let Some(operating_hours) = self.operating_hours {
            station.operating_hours = operating_hours;
        }
        if let Some(is_active) = self.is_active {
            station.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        // 2024-05-06 is a monday
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn default_hours_cover_daytime_only() {
        let hours = OperatingHours::default();
        assert!(hours.is_open_at(at(6, 5, 0)));
        assert!(hours.is_open_at(at(6, 20, 59)));
        assert!(!hours.is_open_at(at(6, 21, 0)));
        assert!(!hours.is_open_at(at(6, 4, 59)));
    }

    #[test]
    fn closed_day_is_never_open() {
        let mut hours = OperatingHours::default();
        hours.sunday = DayHours::closed();
        // 2024-05-12 is a sunday
        assert!(!hours.is_open_at(at(12, 12, 0)));
        assert!(hours.is_open_at(at(11, 12, 0)));
    }

    #[test]
    fn overnight_opening_spills_into_next_morning() {
        let mut hours = OperatingHours::every_day(DayHours::closed());
        hours.friday = DayHours::open(time(18, 0), time(2, 0));
        // friday 2024-05-10 evening, saturday early morning
        assert!(hours.is_open_at(at(10, 23, 30)));
        assert!(hours.is_open_at(at(11, 1, 30)));
        assert!(!hours.is_open_at(at(11, 2, 30)));
        assert!(!hours.is_open_at(at(10, 17, 0)));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut station = Station::example_data();
        StationPatch {
            capacity: Some(12),
            is_active: Some(false),
            ..Default::default()
        }
        .apply(&mut station);
        assert_eq!(station.capacity, 12);
        assert!(!station.is_active);
        assert_eq!(station.name, "Gaborone Bus Rank");
    }

    #[test]
    fn patched_names_are_trimmed() {
        let mut station = Station::example_data();
        StationPatch {
            name: Some("  Main Rank \n".to_owned()),
            ..Default::default()
        }
        .apply(&mut station);
        assert_eq!(station.name, "Main Rank");
    }

    #[test]
    fn day_hours_json_shape() {
        let json = serde_json::to_value(DayHours::open(time(6, 0), time(20, 30))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"open": "06:00", "close": "20:30", "closed": false})
        );
    }
}
