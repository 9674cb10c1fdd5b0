use model::{notification::Notification, user::User, WithId};
use sqlx::{Executor, Postgres};
use transport_queue::database::Result;
use utility::{id::Id, let_also::LetAlso};

use crate::data_model::{notification::NotificationRow, with_ids, DatabaseRow};

use super::convert_error;

pub async fn insert<'c, E>(executor: E, notification: WithId<Notification>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = NotificationRow::from_model(notification);
    sqlx::query(
        "
        INSERT INTO notifications(
            id,
            recipient,
            station_id,
            entry_id,
            kind,
            message,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7);
        ",
    )
    .bind(row.id)
    .bind(row.recipient)
    .bind(row.station_id)
    .bind(row.entry_id)
    .bind(row.kind)
    .bind(row.message)
    .bind(row.created_at)
    .execute(executor)
    .await
    .map_err(convert_error)
    .map(|_| ())
}

/// Deletes the recipient's notifications beyond the newest `keep`.
pub async fn prune<'c, E>(executor: E, recipient: &Id<User>, keep: u32) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        DELETE FROM notifications
        WHERE recipient = $1
        AND id NOT IN (
            SELECT id FROM notifications
            WHERE recipient = $1
            ORDER BY created_at DESC
            LIMIT $2
        );
        ",
    )
    .bind(recipient.raw())
    .bind(i64::from(keep))
    .execute(executor)
    .await
    .map_err(convert_error)
    .map(|result| result.rows_affected())
}

pub async fn get_by_recipient<'c, E>(
    executor: E,
    recipient: &Id<User>,
    limit: u32,
) -> Result<Vec<WithId<Notification>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT * FROM notifications
        WHERE recipient = $1
        ORDER BY created_at DESC
        LIMIT $2;
        ",
    )
    .bind(recipient.raw())
    .bind(i64::from(limit))
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<NotificationRow>| with_ids(rows))
}
