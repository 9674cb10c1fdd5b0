use async_trait::async_trait;
use chrono::{DateTime, Local};
use model::{
    queue::QueueEntry,
    station::Station,
    user::User,
    DateTimeRange, WithId,
};
use sqlx::prelude::FromRow;
use transport_queue::database::{QueueRepo, Result};
use utility::id::{Id, IdWrapper};

use crate::{
    queries::{
        parse_column,
        queue::{archive, delete, get, get_by_owner, get_by_station, get_history, insert, update},
        to_unsigned,
    },
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct QueueEntryRow {
    pub id: String,
    pub station_id: String,
    pub owner: Option<String>,
    pub operator_name: String,
    pub vehicle_number: String,
    pub route: String,
    pub destination: String,
    pub capacity: i32,
    pub service_type: String,
    pub status: String,
    pub position: Option<i32>,
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

impl DatabaseRow for QueueEntryRow {
    type Model = QueueEntry;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        Ok(QueueEntry {
            station_id: Id::new(self.station_id),
            owner: self.owner.map(Id::new),
            operator_name: self.operator_name,
            vehicle_number: self.vehicle_number,
            route: self.route,
            destination: self.destination,
            capacity: to_unsigned("capacity", self.capacity)?,
            service_type: parse_column("service_type", &self.service_type)?,
            status: parse_column("status", &self.status)?,
            position: self
                .position
                .map(|position| to_unsigned("position", position))
                .transpose()?,
            arrival_time: self.arrival_time,
            loading_start_time: self.loading_start_time,
            loading_end_time: self.loading_end_time,
            departure_time: self.departure_time,
            knock_off_time: self.knock_off_time,
            knock_off_reason: self.knock_off_reason,
            special_request: self.special_request,
            special_request_time: self.special_request_time,
            contact_number: self.contact_number,
            archived: self.archived,
        })
    }

    fn from_model(entry: WithId<QueueEntry>) -> Self {
        let content = entry.content;
        Self {
            id: entry.id.raw(),
            station_id: content.station_id.raw(),
            owner: content.owner.raw(),
            operator_name: content.operator_name,
            vehicle_number: content.vehicle_number,
            route: content.route,
            destination: content.destination,
            capacity: i32::try_from(content.capacity).unwrap_or(i32::MAX),
            service_type: content.service_type.as_str().to_owned(),
            status: content.status.as_str().to_owned(),
            position: content
                .position
                .map(|position| i32::try_from(position).unwrap_or(i32::MAX)),
            arrival_time: content.arrival_time,
            loading_start_time: content.loading_start_time,
            loading_end_time: content.loading_end_time,
            departure_time: content.departure_time,
            knock_off_time: content.knock_off_time,
            knock_off_reason: content.knock_off_reason,
            special_request: content.special_request,
            special_request_time: content.special_request_time,
            contact_number: content.contact_number,
            archived: content.archived,
        }
    }
}

#[async_trait]
impl QueueRepo for PgDatabaseAutocommit {
    async fn insert_entry(&mut self, entry: WithId<QueueEntry>) -> Result<WithId<QueueEntry>> {
        insert(&self.pool, entry).await
    }

    async fn get_entry(&mut self, id: &Id<QueueEntry>) -> Result<WithId<QueueEntry>> {
        get(&self.pool, id).await
    }

    async fn update_entry(&mut self, entry: &WithId<QueueEntry>) -> Result<()> {
        update(&self.pool, entry).await
    }

    async fn delete_entry(&mut self, id: &Id<QueueEntry>) -> Result<()> {
        delete(&self.pool, id).await
    }

    async fn get_station_entries(
        &mut self,
        station: &Id<Station>,
    ) -> Result<Vec<WithId<QueueEntry>>> {
        get_by_station(&self.pool, station).await
    }

    async fn get_owner_entries(&mut self, owner: &Id<User>) -> Result<Vec<WithId<QueueEntry>>> {
        get_by_owner(&self.pool, owner).await
    }

    async fn get_station_history(
        &mut self,
        station: &Id<Station>,
        range: &DateTimeRange<Local>,
    ) -> Result<Vec<WithId<QueueEntry>>> {
        get_history(&self.pool, station, range).await
    }

    async fn archive_entries(&mut self, cutoff: DateTime<Local>) -> Result<u64> {
        archive(&self.pool, cutoff).await
    }
}

#[async_trait]
impl<'a> QueueRepo for PgDatabaseTransaction<'a> {
    async fn insert_entry(&mut self, entry: WithId<QueueEntry>) -> Result<WithId<QueueEntry>> {
        insert(&mut *self.tx, entry).await
    }

    async fn get_entry(&mut self, id: &Id<QueueEntry>) -> Result<WithId<QueueEntry>> {
        get(&mut *self.tx, id).await
    }

    async fn update_entry(&mut self, entry: &WithId<QueueEntry>) -> Result<()> {
        update(&mut *self.tx, entry).await
    }

    async fn delete_entry(&mut self, id: &Id<QueueEntry>) -> Result<()> {
        delete(&mut *self.tx, id).await
    }

    async fn get_station_entries(
        &mut self,
        station: &Id<Station>,
    ) -> Result<Vec<WithId<QueueEntry>>> {
        get_by_station(&mut *self.tx, station).await
    }

    async fn get_owner_entries(&mut self, owner: &Id<User>) -> Result<Vec<WithId<QueueEntry>>> {
        get_by_owner(&mut *self.tx, owner).await
    }

    async fn get_station_history(
        &mut self,
        station: &Id<Station>,
        range: &DateTimeRange<Local>,
    ) -> Result<Vec<WithId<QueueEntry>>> {
        get_history(&mut *self.tx, station, range).await
    }

    async fn archive_entries(&mut self, cutoff: DateTime<Local>) -> Result<u64> {
        archive(&mut *self.tx, cutoff).await
    }
}
