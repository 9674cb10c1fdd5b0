use chrono::{DateTime, Local};
use model::{
    queue::QueueEntry,
    station::Station,
    user::User,
    DateTimeRange, WithId,
};
use sqlx::{Executor, Postgres};
use transport_queue::database::{DatabaseError, Result};
use utility::{id::Id, let_also::LetAlso};

use crate::data_model::{queue::QueueEntryRow, with_id, with_ids, DatabaseRow};

use super::convert_error;

pub async fn insert<'c, E>(
    executor: E,
    entry: WithId<QueueEntry>,
) -> Result<WithId<QueueEntry>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = QueueEntryRow::from_model(entry);
    sqlx::query_as(
        "
        INSERT INTO queue_entries(
            id,
            station_id,
            owner,
            operator_name,
            vehicle_number,
            route,
            destination,
            capacity,
            service_type,
            status,
            position,
            arrival_time,
            loading_start_time,
            loading_end_time,
            departure_time,
            knock_off_time,
            knock_off_reason,
            special_request,
            special_request_time,
            contact_number,
            archived
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
        )
        RETURNING *;
        ",
    )
    .bind(row.id)
    .bind(row.station_id)
    .bind(row.owner)
    .bind(row.operator_name)
    .bind(row.vehicle_number)
    .bind(row.route)
    .bind(row.destination)
    .bind(row.capacity)
    .bind(row.service_type)
    .bind(row.status)
    .bind(row.position)
    .bind(row.arrival_time)
    .bind(row.loading_start_time)
    .bind(row.loading_end_time)
    .bind(row.departure_time)
    .bind(row.knock_off_time)
    .bind(row.knock_off_reason)
    .bind(row.special_request)
    .bind(row.special_request_time)
    .bind(row.contact_number)
    .bind(row.archived)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: QueueEntryRow| with_id(row))
}

pub async fn get<'c, E>(executor: E, id: &Id<QueueEntry>) -> Result<WithId<QueueEntry>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM queue_entries WHERE id = $1;")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .and_then(|row: QueueEntryRow| with_id(row))
}

/// Writes every mutable column. The station and the owner never change.
pub async fn update<'c, E>(executor: E, entry: &WithId<QueueEntry>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = QueueEntryRow::from_model(entry.clone());
    let result = sqlx::query(
        "
        UPDATE queue_entries SET
            operator_name = $2,
            vehicle_number = $3,
            route = $4,
            destination = $5,
            capacity = $6,
            service_type = $7,
            status = $8,
            position = $9,
            arrival_time = $10,
            loading_start_time = $11,
            loading_end_time = $12,
            departure_time = $13,
            knock_off_time = $14,
            knock_off_reason = $15,
            special_request = $16,
            special_request_time = $17,
            contact_number = $18,
            archived = $19
        WHERE id = $1;
        ",
    )
    .bind(row.id)
    .bind(row.operator_name)
    .bind(row.vehicle_number)
    .bind(row.route)
    .bind(row.destination)
    .bind(row.capacity)
    .bind(row.service_type)
    .bind(row.status)
    .bind(row.position)
    .bind(row.arrival_time)
    .bind(row.loading_start_time)
    .bind(row.loading_end_time)
    .bind(row.departure_time)
    .bind(row.knock_off_time)
    .bind(row.knock_off_reason)
    .bind(row.special_request)
    .bind(row.special_request_time)
    .bind(row.contact_number)
    .bind(row.archived)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}

pub async fn delete<'c, E>(executor: E, id: &Id<QueueEntry>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM queue_entries WHERE id = $1;")
        .bind(id.raw())
        .execute(executor)
        .await
        .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}

pub async fn get_by_station<'c, E>(
    executor: E,
    station: &Id<Station>,
) -> Result<Vec<WithId<QueueEntry>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT * FROM queue_entries
        WHERE station_id = $1 AND NOT archived
        ORDER BY position ASC NULLS LAST, arrival_time ASC;
        ",
    )
    .bind(station.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<QueueEntryRow>| with_ids(rows))
}

pub async fn get_by_owner<'c, E>(
    executor: E,
    owner: &Id<User>,
) -> Result<Vec<WithId<QueueEntry>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT * FROM queue_entries
        WHERE owner = $1 AND NOT archived
        ORDER BY arrival_time ASC;
        ",
    )
    .bind(owner.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<QueueEntryRow>| with_ids(rows))
}

/// Entries that arrived, left or were knocked off within the range.
pub async fn get_history<'c, E>(
    executor: E,
    station: &Id<Station>,
    range: &DateTimeRange<Local>,
) -> Result<Vec<WithId<QueueEntry>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT * FROM queue_entries
        WHERE
            station_id = $1
            AND arrival_time < $3
            AND (
                arrival_time >= $2
                OR departure_time >= $2
                OR knock_off_time >= $2
            );
        ",
    )
    .bind(station.raw())
    .bind(range.first)
    .bind(range.last)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<QueueEntryRow>| with_ids(rows))
}

pub async fn archive<'c, E>(executor: E, cutoff: DateTime<Local>) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        UPDATE queue_entries SET archived = TRUE
        WHERE
            NOT archived
            AND (
                (status = 'loaded' AND COALESCE(departure_time, loading_end_time) < $1)
                OR (status = 'knocked_off' AND knock_off_time < $1)
            );
        ",
    )
    .bind(cutoff)
    .execute(executor)
    .await
    .map_err(convert_error)
    .map(|result| result.rows_affected())
}
