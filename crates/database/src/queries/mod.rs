use std::str::FromStr;

use transport_queue::database::DatabaseError;

pub mod coordinator;
pub mod notification;
pub mod queue;
pub mod station;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Conflict(db.message().to_owned())
        }
        _ => DatabaseError::Other(Box::new(why)),
    }
}

/// Parses an enum stored as text.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|why: String| DatabaseError::Other(format!("{}: {}", column, why).into()))
}

/// Counts and positions are unsigned in the model and `INTEGER` in the tables.
pub(crate) fn to_unsigned(column: &str, value: i32) -> Result<u32, DatabaseError> {
    u32::try_from(value).map_err(|_| {
        DatabaseError::Other(format!("{}: negative value {}", column, value).into())
    })
}
