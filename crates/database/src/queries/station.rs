use model::{station::Station, WithId};
use sqlx::{Executor, Postgres};
use transport_queue::database::Result;
use utility::{id::Id, let_also::LetAlso};

use crate::data_model::{station::StationRow, with_id, with_ids, DatabaseRow};

use super::convert_error;

pub async fn insert<'c, E>(executor: E, station: WithId<Station>) -> Result<WithId<Station>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = StationRow::from_model(station);
    sqlx::query_as(
        "
        INSERT INTO stations(
            id,
            name,
            address,
            city,
            capacity,
            operating_hours,
            is_active,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *;
        ",
    )
    .bind(row.id)
    .bind(row.name)
    .bind(row.address)
    .bind(row.city)
    .bind(row.capacity)
    .bind(row.operating_hours)
    .bind(row.is_active)
    .bind(row.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: StationRow| with_id(row))
}

pub async fn get<'c, E>(executor: E, id: &Id<Station>) -> Result<WithId<Station>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM stations WHERE id = $1;")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .and_then(|row: StationRow| with_id(row))
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<Station>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM stations ORDER BY created_at ASC, name ASC;")
        .fetch_all(executor)
        .await
        .map_err(convert_error)?
        .let_owned(|rows: Vec<StationRow>| with_ids(rows))
}

pub async fn update<'c, E>(executor: E, station: WithId<Station>) -> Result<WithId<Station>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = StationRow::from_model(station);
    sqlx::query_as(
        "
        UPDATE stations SET
            name = $2,
            address = $3,
            city = $4,
            capacity = $5,
            operating_hours = $6,
            is_active = $7
        WHERE id = $1
        RETURNING *;
        ",
    )
    .bind(row.id)
    .bind(row.name)
    .bind(row.address)
    .bind(row.city)
    .bind(row.capacity)
    .bind(row.operating_hours)
    .bind(row.is_active)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: StationRow| with_id(row))
}

/// Takes the row lock that serializes all queue writes of a station.
pub async fn lock<'c, E>(executor: E, id: &Id<Station>) -> Result<WithId<Station>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM stations WHERE id = $1 FOR UPDATE;")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .and_then(|row: StationRow| with_id(row))
}
