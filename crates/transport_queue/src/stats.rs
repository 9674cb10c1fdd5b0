use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone};
use model::{
    queue::{QueueEntry, QueueStatus},
    stats::DailyStats,
    DateTimeRange, WithId,
};

/// Local midnight at the start of `date`. Falls back to the earliest valid
/// moment of the day where midnight does not exist.
pub fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

pub fn day_range(date: NaiveDate) -> DateTimeRange<Local> {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    DateTimeRange::new(start_of_day(date), start_of_day(next))
}

fn on(date: NaiveDate, time: Option<DateTime<Local>>) -> bool {
    time.is_some_and(|time| time.date_naive() == date)
}

/// Figures of one local day.
///
/// * processed: entries loaded that day
/// * knock offs: entries knocked off that day
/// * special requests: entries arriving that day that asked for special
///   handling
/// * average wait: minutes between arrival and the start of loading for the
///   entries processed that day
pub fn daily_stats<'a, I>(date: NaiveDate, entries: I) -> DailyStats
where
    I: IntoIterator<Item = &'a WithId<QueueEntry>>,
{
    let mut stats = DailyStats::empty(date);
    let mut waited_minutes = 0.0;

    for entry in entries.into_iter().map(|entry| &entry.content) {
        if entry.special_request && on(date, Some(entry.arrival_time)) {
            stats.special_requests += 1;
        }
        match entry.status {
            QueueStatus::Loaded if on(date, entry.terminal_time()) => {
                stats.total_processed += 1;
                let started = entry
                    .loading_start_time
                    .or(entry.departure_time)
                    .unwrap_or(entry.arrival_time);
                let waited = (started - entry.arrival_time).num_seconds().max(0);
                waited_minutes += waited as f64 / 60.0;
            }
            QueueStatus::KnockedOff if on(date, entry.knock_off_time) => {
                stats.knock_offs += 1;
            }
            _ => {}
        }
    }

    if stats.total_processed > 0 {
        stats.average_wait_time = waited_minutes / stats.total_processed as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use model::ExampleData;
    use utility::id::Id;

    use super::*;

    fn entry(arrival: DateTime<Local>) -> WithId<QueueEntry> {
        let mut entry = QueueEntry::example_data();
        entry.arrival_time = arrival;
        entry.position = None;
        WithId::new(Id::generate(), entry)
    }

    fn loaded(arrival: DateTime<Local>, waited: i64) -> WithId<QueueEntry> {
        let mut entry = entry(arrival);
        let start = arrival + Duration::minutes(waited);
        entry.content.status = QueueStatus::Loaded;
        entry.content.loading_start_time = Some(start);
        entry.content.loading_end_time = Some(start + Duration::minutes(5));
        entry.content.departure_time = Some(start + Duration::minutes(5));
        entry
    }

    fn morning(date: NaiveDate) -> DateTime<Local> {
        start_of_day(date) + Duration::hours(8)
    }

    #[test]
    fn empty_day_has_zero_average() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(daily_stats(date, &[]), DailyStats::empty(date));
    }

    #[test]
    fn counts_the_day_only() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let yesterday = date.pred_opt().unwrap();

        let mut knocked = entry(morning(date));
        knocked.content.status = QueueStatus::KnockedOff;
        knocked.content.knock_off_time = Some(morning(date) + Duration::hours(1));
        knocked.content.knock_off_reason = Some("breakdown".to_owned());

        let mut special = entry(morning(date));
        special.content.status = QueueStatus::Special;
        special.content.special_request = true;

        let entries = vec![
            loaded(morning(date), 10),
            loaded(morning(date), 20),
            loaded(morning(yesterday), 90),
            knocked,
            special,
            entry(morning(date)),
        ];

        let stats = daily_stats(date, &entries);
        assert_eq!(stats.total_processed, 2);
        assert_eq!(stats.knock_offs, 1);
        assert_eq!(stats.special_requests, 1);
        assert!((stats.average_wait_time - 15.0).abs() < 1e-9);
    }

    #[test]
    fn day_range_covers_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let range = day_range(date);
        assert!(range.contains(&morning(date)));
        assert!(!range.contains(&morning(date.succ_opt().unwrap())));
        assert!(range.contains(&range.first));
        assert!(!range.contains(&range.last));
    }
}
