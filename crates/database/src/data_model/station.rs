use async_trait::async_trait;
use chrono::{DateTime, Local};
use model::{
    station::{OperatingHours, Station},
    WithId,
};
use sqlx::{prelude::FromRow, types::Json};
use transport_queue::database::{Result, StationRepo};
use utility::id::Id;

use crate::{
    queries::{
        station::{get, get_all, insert, lock, update},
        to_unsigned,
    },
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct StationRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub capacity: i32,
    pub operating_hours: Json<OperatingHours>,
    pub is_active: bool,
    pub created_at: DateTime<Local>,
}

impl DatabaseRow for StationRow {
    type Model = Station;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        Ok(Station {
            name: self.name,
            address: self.address,
            city: self.city,
            capacity: to_unsigned("capacity", self.capacity)?,
            operating_hours: self.operating_hours.0,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }

    fn from_model(station: WithId<Station>) -> Self {
        Self {
            id: station.id.raw(),
            name: station.content.name,
            address: station.content.address,
            city: station.content.city,
            capacity: i32::try_from(station.content.capacity).unwrap_or(i32::MAX),
            operating_hours: Json(station.content.operating_hours),
            is_active: station.content.is_active,
            created_at: station.content.created_at,
        }
    }
}

#[async_trait]
impl StationRepo for PgDatabaseAutocommit {
    async fn insert_station(&mut self, station: WithId<Station>) -> Result<WithId<Station>> {
        insert(&self.pool, station).await
    }

    async fn get_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>> {
        get(&self.pool, id).await
    }

    async fn get_stations(&mut self) -> Result<Vec<WithId<Station>>> {
        get_all(&self.pool).await
    }

    async fn update_station(&mut self, station: WithId<Station>) -> Result<WithId<Station>> {
        update(&self.pool, station).await
    }

    async fn lock_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>> {
        // outside of a transaction the lock ends with the statement
        get(&self.pool, id).await
    }
}

#[async_trait]
impl<'a> StationRepo for PgDatabaseTransaction<'a> {
    async fn insert_station(&mut self, station: WithId<Station>) -> Result<WithId<Station>> {
        insert(&mut *self.tx, station).await
    }

    async fn get_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>> {
        get(&mut *self.tx, id).await
    }

    async fn get_stations(&mut self) -> Result<Vec<WithId<Station>>> {
        get_all(&mut *self.tx).await
    }

    async fn update_station(&mut self, station: WithId<Station>) -> Result<WithId<Station>> {
        update(&mut *self.tx, station).await
    }

    async fn lock_station(&mut self, id: &Id<Station>) -> Result<WithId<Station>> {
        lock(&mut *self.tx, id).await
    }
}
