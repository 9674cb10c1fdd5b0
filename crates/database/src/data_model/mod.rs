use std::fmt::Debug;

use model::WithId;
use serde::Serialize;
use transport_queue::database::Result;
use utility::id::{HasId, Id};

pub mod coordinator;
pub mod notification;
pub mod queue;
pub mod station;

pub trait DatabaseRow: Sized {
    type Model: HasId;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Result<Self::Model>;
    fn from_model(model: WithId<Self::Model>) -> Self
    where
        <Self::Model as HasId>::IdType: Debug + Clone + Serialize;
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Result<Vec<WithId<R::Model>>>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    rows.into_iter().map(with_id).collect()
}

pub fn with_id<R: DatabaseRow>(row: R) -> Result<WithId<R::Model>>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    let id = row.get_id();
    Ok(WithId::new(id, row.to_model()?))
}
