/// (De)serializes a `NaiveTime` as `HH:MM`, the way operating hours are
/// entered in the station forms. Seconds are accepted when deserializing.
pub mod hour_minute {
    use chrono::NaiveTime;
    use schemars::gen::SchemaGenerator;
    use schemars::schema::{InstanceType, Schema, SchemaObject};
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(D::Error::custom)
    }

    pub fn parse(s: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(s.trim(), FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
            .map_err(|_| format!("expected a time of day as HH:MM, got `{}`", s))
    }

    pub fn schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            format: Some("hh:mm".to_owned()),
            ..Default::default()
        }
        .into()
    }
}

pub mod date_time {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone as _};
    use serde::{de::Error, Deserialize as _, Deserializer};

    /// Parses either an RFC 3339 timestamp (`2024-05-01T06:30:00.000Z`, as sent
    /// by browsers) or a naive local one (`2024-05-01T06:30:00`).
    pub fn parse_local(s: &str) -> Result<DateTime<Local>, String> {
        if let Ok(date_time) = DateTime::parse_from_rfc3339(s) {
            return Ok(date_time.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .map_err(|why| format!("invalid timestamp `{}`: {}", s, why))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| format!("`{}` does not exist in the local time zone", s))
    }

    pub fn deserialize_local<'de, D>(
        deserializer: D,
    ) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_local(&s).map_err(Error::custom)
    }

    pub fn deserialize_local_option<'de, D>(
        deserializer: D,
    ) -> Result<Option<DateTime<Local>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.trim().is_empty() => {
                parse_local(s.trim()).map(Some).map_err(Error::custom)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Hours {
        #[serde(with = "super::hour_minute")]
        open: NaiveTime,
    }

    #[test]
    fn hour_minute_round_trips_without_seconds() {
        let hours: Hours = serde_json::from_str(r#"{"open":"06:30"}"#).unwrap();
        assert_eq!(hours.open, NaiveTime::from_hms_opt(6, 30, 0).unwrap());
        assert_eq!(serde_json::to_string(&hours).unwrap(), r#"{"open":"06:30"}"#);
    }

    #[test]
    fn hour_minute_accepts_seconds_and_rejects_garbage() {
        assert!(super::hour_minute::parse("21:15:00").is_ok());
        assert!(super::hour_minute::parse("quarter past").is_err());
        assert!(super::hour_minute::parse("25:00").is_err());
    }

    #[test]
    fn parse_local_accepts_browser_and_naive_timestamps() {
        let browser = super::date_time::parse_local("2024-05-01T06:30:00.000Z");
        assert!(browser.is_ok());
        let naive = super::date_time::parse_local("2024-05-01T06:30:00").unwrap();
        assert_eq!(naive.hour(), 6);
        assert_eq!(naive.minute(), 30);
        assert!(super::date_time::parse_local("yesterday").is_err());
    }
}
