use model::queue::QueueStatus;
use thiserror::Error;

pub mod client;
pub mod database;
pub mod dispatch;
pub mod jobs;
pub mod memory;
pub mod queue;
pub mod server;
pub mod stats;

/// Everything a queue operation can fail with. The display text is meant to
/// be shown to the user as is.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(String),

    #[error("Vehicle {vehicle_number} already has an active entry at this station.")]
    DuplicateActiveEntry { vehicle_number: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("An entry that is `{from}` can not become `{attempted}`.")]
    IllegalTransition {
        from: QueueStatus,
        attempted: String,
    },

    #[error("{0}")]
    InvalidMove(String),

    #[error("The station still has {active} active queue entries.")]
    StationBusy { active: usize },

    #[error("All {capacity} waiting bays of the station are taken.")]
    StationFull { capacity: u32 },

    #[error("The station is not active.")]
    StationInactive,

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(database::DatabaseError),
}

impl RequestError {
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid(message.into())
    }
}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => {
                Self::NotFound("The requested item does not exist.".to_owned())
            }
            other => Self::Database(other),
        }
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

pub fn not_found_to_none<O>(result: RequestResult<O>) -> RequestResult<Option<O>> {
    if let Err(RequestError::NotFound(_)) = result {
        Ok(None)
    } else {
        result.map(Some)
    }
}
