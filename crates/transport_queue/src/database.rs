use std::{error, fmt, result};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use model::{
    coordinator::CoordinatorProfile,
    notification::Notification,
    queue::QueueEntry,
    station::Station,
    user::User,
    DateTimeRange, WithId,
};
use utility::id::Id;

/// Notifications kept per recipient. Older ones are dropped on push.
pub const NOTIFICATION_HISTORY: u32 = 100;

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    /// A uniqueness or integrity constraint rejected the write.
    Conflict(String),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "row not found"),
            Self::Conflict(why) => write!(f, "conflict: {}", why),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait StationRepo {
    async fn insert_station(
        &mut self,
        station: WithId<Station>,
    ) -> Result<WithId<Station>>;

    async fn get_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>>;

    async fn get_stations(&mut self) -> Result<Vec<WithId<Station>>>;

    async fn update_station(
        &mut self,
        station: WithId<Station>,
    ) -> Result<WithId<Station>>;

    /// Returns the station and holds a lock on it until the surrounding
    /// transaction ends. Every read-then-write of a station's positions has to
    /// take this lock first.
    async fn lock_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>>;
}

#[async_trait]
pub trait QueueRepo {
    async fn insert_entry(
        &mut self,
        entry: WithId<QueueEntry>,
    ) -> Result<WithId<QueueEntry>>;

    async fn get_entry(&mut self, id: &Id<QueueEntry>) -> Result<WithId<QueueEntry>>;

    async fn update_entry(&mut self, entry: &WithId<QueueEntry>) -> Result<()>;

    async fn delete_entry(&mut self, id: &Id<QueueEntry>) -> Result<()>;

    /// All entries of a station which are not archived yet.
    async fn get_station_entries(
        &mut self,
        station: &Id<Station>,
    ) -> Result<Vec<WithId<QueueEntry>>>;

    /// All entries of a driver which are not archived yet.
    async fn get_owner_entries(
        &mut self,
        owner: &Id<User>,
    ) -> Result<Vec<WithId<QueueEntry>>>;

    /// Entries of a station, archived or not, which may have been at the
    /// station during the given range.
    ///
    /// # WARNING
    ///
    /// Implementations may return more entries than strictly fall into the
    /// range. Callers have to filter by the timestamps they care about.
    async fn get_station_history(
        &mut self,
        station: &Id<Station>,
        range: &DateTimeRange<Local>,
    ) -> Result<Vec<WithId<QueueEntry>>>;

    /// Marks all terminal entries which ended before `cutoff` as archived and
    /// returns how many were affected.
    async fn archive_entries(&mut self, cutoff: DateTime<Local>) -> Result<u64>;
}

#[async_trait]
pub trait CoordinatorRepo {
    async fn insert_coordinator(
        &mut self,
        profile: WithId<CoordinatorProfile>,
    ) -> Result<WithId<CoordinatorProfile>>;

    async fn coordinator_by_user(
        &mut self,
        user: &Id<User>,
    ) -> Result<WithId<CoordinatorProfile>>;

    async fn update_coordinator(
        &mut self,
        profile: &WithId<CoordinatorProfile>,
    ) -> Result<()>;
}

#[async_trait]
pub trait NotificationRepo {
    /// Stores the notification and drops the recipient's notifications beyond
    /// the newest [`NOTIFICATION_HISTORY`].
    async fn push_notification(
        &mut self,
        notification: WithId<Notification>,
    ) -> Result<()>;

    /// Newest first.
    async fn get_notifications(
        &mut self,
        recipient: &Id<User>,
        limit: u32,
    ) -> Result<Vec<WithId<Notification>>>;
}

pub trait DatabaseOperations:
    StationRepo + QueueRepo + CoordinatorRepo + NotificationRepo + Send
{
}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// trait to implement a queue database.
/// multiple concurrent accesses should be possible by e.g. cloning the database object.
/// Dropping a transaction without committing it discards its writes.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized + 'static {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}
