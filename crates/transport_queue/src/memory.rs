//! A [`Database`] kept in process memory.
//!
//! Used for tests and for running the server without Postgres. A transaction
//! holds the one lock over the whole state. Its first write takes a copy of
//! the state, which is written back on commit. Transactions are therefore
//! fully serialized, and read-only ones never copy anything.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use model::{
    coordinator::CoordinatorProfile,
    notification::Notification,
    queue::{normalize_vehicle_number, QueueEntry},
    station::Station,
    user::User,
    DateTimeRange, WithId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use utility::id::{HasId, Id};

use crate::database::{
    CoordinatorRepo, Database, DatabaseAutocommit, DatabaseError, DatabaseOperations,
    DatabaseTransaction, NotificationRepo, QueueRepo, Result, StationRepo,
    NOTIFICATION_HISTORY,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    stations: IndexMap<Id<Station>, Station>,
    entries: IndexMap<Id<QueueEntry>, QueueEntry>,
    coordinators: IndexMap<Id<CoordinatorProfile>, CoordinatorProfile>,
    /// Oldest first, per recipient.
    notifications: IndexMap<Id<User>, VecDeque<WithId<Notification>>>,
}

fn found<V>(id: &Id<V>, value: Option<&V>) -> Result<WithId<V>>
where
    V: HasId<IdType = String> + Clone,
{
    value
        .map(|value| WithId::new(id.clone(), value.clone()))
        .ok_or(DatabaseError::NotFound)
}

impl MemoryState {
    fn insert_station(&mut self, station: WithId<Station>) -> Result<WithId<Station>> {
        if self.stations.contains_key(&station.id) {
            return Err(DatabaseError::Conflict(format!(
                "station {} exists",
                station.id
            )));
        }
        self.stations
            .insert(station.id.clone(), station.content.clone());
        Ok(station)
    }

    fn get_station(&self, id: &Id<Station>) -> Result<WithId<Station>> {
        found(id, self.stations.get(id))
    }

    fn get_stations(&self) -> Result<Vec<WithId<Station>>> {
        Ok(self
            .stations
            .iter()
            .map(|(id, station)| WithId::new(id.clone(), station.clone()))
            .collect())
    }

    fn update_station(&mut self, station: WithId<Station>) -> Result<WithId<Station>> {
        let stored = self
            .stations
            .get_mut(&station.id)
            .ok_or(DatabaseError::NotFound)?;
        *stored = station.content.clone();
        Ok(station)
    }

    fn collides(&self, id: &Id<QueueEntry>, entry: &QueueEntry) -> bool {
        let vehicle_number = normalize_vehicle_number(&entry.vehicle_number);
        entry.status.is_active()
            && !entry.archived
            && self.entries.iter().any(|(other_id, other)| {
                other_id != id
                    && other.station_id == entry.station_id
                    && other.status.is_active()
                    && !other.archived
                    && normalize_vehicle_number(&other.vehicle_number) == vehicle_number
            })
    }

    fn insert_entry(&mut self, entry: WithId<QueueEntry>) -> Result<WithId<QueueEntry>> {
        if self.entries.contains_key(&entry.id) {
            return Err(DatabaseError::Conflict(format!("entry {} exists", entry.id)));
        }
        if self.collides(&entry.id, &entry.content) {
            return Err(DatabaseError::Conflict(format!(
                "vehicle {} is already queued",
                entry.content.vehicle_number
            )));
        }
        self.entries.insert(entry.id.clone(), entry.content.clone());
        Ok(entry)
    }

    fn get_entry(&self, id: &Id<QueueEntry>) -> Result<WithId<QueueEntry>> {
        found(id, self.entries.get(id))
    }

    fn update_entry(&mut self, entry: &WithId<QueueEntry>) -> Result<()> {
        if !self.entries.contains_key(&entry.id) {
            return Err(DatabaseError::NotFound);
        }
        if self.collides(&entry.id, &entry.content) {
            return Err(DatabaseError::Conflict(format!(
                "vehicle {} is already queued",
                entry.content.vehicle_number
            )));
        }
        self.entries.insert(entry.id.clone(), entry.content.clone());
        Ok(())
    }

    fn delete_entry(&mut self, id: &Id<QueueEntry>) -> Result<()> {
        self.entries
            .shift_remove(id)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound)
    }

    fn entries_where<F>(&self, filter: F) -> Vec<WithId<QueueEntry>>
    where
        F: Fn(&QueueEntry) -> bool,
    {
        self.entries
            .iter()
            .filter(|(_, entry)| filter(entry))
            .map(|(id, entry)| WithId::new(id.clone(), entry.clone()))
            .collect()
    }

    fn get_station_entries(&self, station: &Id<Station>) -> Result<Vec<WithId<QueueEntry>>> {
        Ok(self.entries_where(|entry| entry.station_id == *station && !entry.archived))
    }

    fn get_owner_entries(&self, owner: &Id<User>) -> Result<Vec<WithId<QueueEntry>>> {
        Ok(self.entries_where(|entry| entry.is_owned_by(owner) && !entry.archived))
    }

    fn get_station_history(
        &self,
        station: &Id<Station>,
        range: &DateTimeRange<Local>,
    ) -> Result<Vec<WithId<QueueEntry>>> {
        Ok(self.entries_where(|entry| {
            entry.station_id == *station && entry.arrival_time < range.last
        }))
    }

    fn archive_entries(&mut self, cutoff: DateTime<Local>) -> Result<u64> {
        let mut archived = 0;
        for entry in self.entries.values_mut() {
            let ended_before = entry.terminal_time().is_some_and(|time| time < cutoff);
            if !entry.archived && ended_before {
                entry.archived = true;
                archived += 1;
            }
        }
        Ok(archived)
    }

    fn insert_coordinator(
        &mut self,
        profile: WithId<CoordinatorProfile>,
    ) -> Result<WithId<CoordinatorProfile>> {
        let taken = self.coordinators.contains_key(&profile.id)
            || self
                .coordinators
                .values()
                .any(|other| other.user == profile.content.user);
        if taken {
            return Err(DatabaseError::Conflict(format!(
                "user {} already is a coordinator",
                profile.content.user
            )));
        }
        self.coordinators
            .insert(profile.id.clone(), profile.content.clone());
        Ok(profile)
    }

    fn coordinator_by_user(&self, user: &Id<User>) -> Result<WithId<CoordinatorProfile>> {
        self.coordinators
            .iter()
            .find(|(_, profile)| profile.user == *user)
            .map(|(id, profile)| WithId::new(id.clone(), profile.clone()))
            .ok_or(DatabaseError::NotFound)
    }

    fn update_coordinator(&mut self, profile: &WithId<CoordinatorProfile>) -> Result<()> {
        let stored = self
            .coordinators
            .get_mut(&profile.id)
            .ok_or(DatabaseError::NotFound)?;
        *stored = profile.content.clone();
        Ok(())
    }

    fn push_notification(&mut self, notification: WithId<Notification>) -> Result<()> {
        let inbox = self
            .notifications
            .entry(notification.content.recipient.clone())
            .or_default();
        inbox.push_back(notification);
        while inbox.len() > NOTIFICATION_HISTORY as usize {
            inbox.pop_front();
        }
        Ok(())
    }

    fn get_notifications(
        &self,
        recipient: &Id<User>,
        limit: u32,
    ) -> Result<Vec<WithId<Notification>>> {
        Ok(self
            .notifications
            .get(recipient)
            .map(|inbox| inbox.iter().rev().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: Option<MemoryState>,
}

impl MemoryTransaction {
    fn read(&self) -> &MemoryState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn write(&mut self) -> &mut MemoryState {
        let committed = &self.guard;
        self.working
            .get_or_insert_with(|| MemoryState::clone(committed))
    }

    /// Whether the transaction has written anything yet.
    pub fn is_dirty(&self) -> bool {
        self.working.is_some()
    }
}

pub struct MemoryAutocommit {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;
    type Autocommit = MemoryAutocommit;

    async fn transaction(&self) -> Result<Self::Transaction> {
        let guard = self.state.clone().lock_owned().await;
        Ok(MemoryTransaction {
            guard,
            working: None,
        })
    }

    fn auto(&self) -> Self::Autocommit {
        MemoryAutocommit {
            state: self.state.clone(),
        }
    }
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(self) -> Result<()> {
        let Self { mut guard, working } = self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}

impl DatabaseAutocommit for MemoryAutocommit {}

impl DatabaseOperations for MemoryTransaction {}

impl DatabaseOperations for MemoryAutocommit {}

/// Implements the repositories for a handle, given how the handle reaches the
/// state for reading and for writing.
macro_rules! memory_repos {
    ($handle:ty, $this:ident => $read:expr, $write:expr) => {
        #[async_trait]
        impl StationRepo for $handle {
            async fn insert_station(
                &mut self,
                station: WithId<Station>,
            ) -> Result<WithId<Station>> {
                let $this = self;
                $write.insert_station(station)
            }

            async fn get_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>> {
                let $this = self;
                $read.get_station(id)
            }

            async fn get_stations(&mut self) -> Result<Vec<WithId<Station>>> {
                let $this = self;
                $read.get_stations()
            }

            async fn update_station(
                &mut self,
                station: WithId<Station>,
            ) -> Result<WithId<Station>> {
                let $this = self;
                $write.update_station(station)
            }

            async fn lock_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>> {
                let $this = self;
                $read.get_station(id)
            }
        }

        #[async_trait]
        impl QueueRepo for $handle {
            async fn insert_entry(
                &mut self,
                entry: WithId<QueueEntry>,
            ) -> Result<WithId<QueueEntry>> {
                let $this = self;
                $write.insert_entry(entry)
            }

            async fn get_entry(
                &mut self,
                id: &Id<QueueEntry>,
            ) -> Result<WithId<QueueEntry>> {
                let $this = self;
                $read.get_entry(id)
            }

            async fn update_entry(&mut self, entry: &WithId<QueueEntry>) -> Result<()> {
                let $this = self;
                $write.update_entry(entry)
            }

            async fn delete_entry(&mut self, id: &Id<QueueEntry>) -> Result<()> {
                let $this = self;
                $write.delete_entry(id)
            }

            async fn get_station_entries(
                &mut self,
                station: &Id<Station>,
            ) -> Result<Vec<WithId<QueueEntry>>> {
                let $this = self;
                $read.get_station_entries(station)
            }

            async fn get_owner_entries(
                &mut self,
                owner: &Id<User>,
            ) -> Result<Vec<WithId<QueueEntry>>> {
                let $this = self;
                $read.get_owner_entries(owner)
            }

            async fn get_station_history(
                &mut self,
                station: &Id<Station>,
                range: &DateTimeRange<Local>,
            ) -> Result<Vec<WithId<QueueEntry>>> {
                let $this = self;
                $read.get_station_history(station, range)
            }

            async fn archive_entries(&mut self, cutoff: DateTime<Local>) -> Result<u64> {
                let $this = self;
                $write.archive_entries(cutoff)
            }
        }

        #[async_trait]
        impl CoordinatorRepo for $handle {
            async fn insert_coordinator(
                &mut self,
                profile: WithId<CoordinatorProfile>,
            ) -> Result<WithId<CoordinatorProfile>> {
                let $this = self;
                $write.insert_coordinator(profile)
            }

            async fn coordinator_by_user(
                &mut self,
                user: &Id<User>,
            ) -> Result<WithId<CoordinatorProfile>> {
                let $this = self;
                $read.coordinator_by_user(user)
            }

            async fn update_coordinator(
                &mut self,
                profile: &WithId<CoordinatorProfile>,
            ) -> Result<()> {
                let $this = self;
                $write.update_coordinator(profile)
            }
        }

        #[async_trait]
        impl NotificationRepo for $handle {
            async fn push_notification(
                &mut self,
                notification: WithId<Notification>,
            ) -> Result<()> {
                let $this = self;
                $write.push_notification(notification)
            }

            async fn get_notifications(
                &mut self,
                recipient: &Id<User>,
                limit: u32,
            ) -> Result<Vec<WithId<Notification>>> {
                let $this = self;
                $read.get_notifications(recipient, limit)
            }
        }
    };
}

memory_repos!(MemoryTransaction, this => this.read(), this.write());
memory_repos!(
    MemoryAutocommit,
    this => this.state.lock().await,
    this.state.lock().await
);

#[cfg(test)]
mod tests {
    use model::ExampleData;

    use super::*;

    fn entry() -> WithId<QueueEntry> {
        WithId::new(Id::generate(), QueueEntry::example_data())
    }

    #[tokio::test]
    async fn dropped_transactions_leave_no_trace() {
        let database = MemoryDatabase::new();
        {
            let mut tx = database.transaction().await.unwrap();
            tx.insert_entry(entry()).await.unwrap();
        }
        let station = QueueEntry::example_data().station_id;
        assert!(database
            .auto()
            .get_station_entries(&station)
            .await
            .unwrap()
            .is_empty());

        let mut tx = database.transaction().await.unwrap();
        tx.insert_entry(entry()).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(
            database
                .auto()
                .get_station_entries(&station)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn same_vehicle_can_not_be_active_twice() {
        let database = MemoryDatabase::new();
        let mut auto = database.auto();
        auto.insert_entry(entry()).await.unwrap();

        let mut again = entry();
        again.content.vehicle_number = " b123abc".to_owned();
        let result = auto.insert_entry(again.clone()).await;
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));

        again.content.status = model::queue::QueueStatus::Loaded;
        auto.insert_entry(again).await.unwrap();
    }

    #[tokio::test]
    async fn notifications_are_newest_first() {
        let database = MemoryDatabase::new();
        let mut auto = database.auto();
        let recipient: Id<User> = Id::new("driver".to_owned());
        for n in 0..3 {
            auto.push_notification(WithId::new(
                Id::generate(),
                Notification {
                    recipient: recipient.clone(),
                    station_id: None,
                    entry_id: None,
                    kind: model::notification::NotificationKind::PositionChanged,
                    message: n.to_string(),
                    created_at: Local::now(),
                },
            ))
            .await
            .unwrap();
        }
        let messages = auto
            .get_notifications(&recipient, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|notification| notification.content.message)
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn reading_transactions_take_no_copy() {
        let database = MemoryDatabase::new();
        let station = QueueEntry::example_data().station_id;

        let mut tx = database.transaction().await.unwrap();
        tx.get_station_entries(&station).await.unwrap();
        tx.get_notifications(&Id::new("driver".to_owned()), 10)
            .await
            .unwrap();
        assert!(!tx.is_dirty());

        tx.insert_entry(entry()).await.unwrap();
        assert!(tx.is_dirty());
        assert_eq!(tx.get_station_entries(&station).await.unwrap().len(), 1);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn notifications_are_capped_per_recipient() {
        let database = MemoryDatabase::new();
        let mut auto = database.auto();
        let busy: Id<User> = Id::new("busy".to_owned());
        let quiet: Id<User> = Id::new("quiet".to_owned());
        let notification = |recipient: &Id<User>, message: String| {
            WithId::new(
                Id::generate(),
                Notification {
                    recipient: recipient.clone(),
                    station_id: None,
                    entry_id: None,
                    kind: model::notification::NotificationKind::PositionChanged,
                    message,
                    created_at: Local::now(),
                },
            )
        };

        auto.push_notification(notification(&quiet, "hello".to_owned()))
            .await
            .unwrap();
        let total = NOTIFICATION_HISTORY + 5;
        for n in 0..total {
            auto.push_notification(notification(&busy, n.to_string()))
                .await
                .unwrap();
        }

        let kept = auto.get_notifications(&busy, u32::MAX).await.unwrap();
        assert_eq!(kept.len(), NOTIFICATION_HISTORY as usize);
        assert_eq!(kept[0].content.message, (total - 1).to_string());
        assert_eq!(
            kept.last().unwrap().content.message,
            (total - NOTIFICATION_HISTORY).to_string()
        );
        assert_eq!(auto.get_notifications(&quiet, 10).await.unwrap().len(), 1);
    }
}
