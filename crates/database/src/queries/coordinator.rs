use model::{coordinator::CoordinatorProfile, user::User, WithId};
use sqlx::{Executor, Postgres};
use transport_queue::database::{DatabaseError, Result};
use utility::id::Id;

use crate::data_model::{coordinator::CoordinatorRow, with_id, DatabaseRow};

use super::convert_error;

pub async fn insert<'c, E>(
    executor: E,
    profile: WithId<CoordinatorProfile>,
) -> Result<WithId<CoordinatorProfile>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = CoordinatorRow::from_model(profile);
    sqlx::query_as(
        "
        INSERT INTO coordinators(
            id,
            user_id,
            stations,
            specializations,
            working_hours,
            rating,
            experience,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *;
        ",
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(row.stations)
    .bind(row.specializations)
    .bind(row.working_hours)
    .bind(row.rating)
    .bind(row.experience)
    .bind(row.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: CoordinatorRow| with_id(row))
}

pub async fn get_by_user<'c, E>(
    executor: E,
    user: &Id<User>,
) -> Result<WithId<CoordinatorProfile>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT * FROM coordinators WHERE user_id = $1;")
        .bind(user.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .and_then(|row: CoordinatorRow| with_id(row))
}

pub async fn update<'c, E>(executor: E, profile: &WithId<CoordinatorProfile>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = CoordinatorRow::from_model(profile.clone());
    let result = sqlx::query(
        "
        UPDATE coordinators SET
            stations = $2,
            specializations = $3,
            working_hours = $4,
            rating = $5,
            experience = $6
        WHERE id = $1;
        ",
    )
    .bind(row.id)
    .bind(row.stations)
    .bind(row.specializations)
    .bind(row.working_hours)
    .bind(row.rating)
    .bind(row.experience)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}
