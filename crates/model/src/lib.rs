use chrono::{DateTime, TimeZone};
use schemars::JsonSchema;
use std::fmt::Debug;

use serde::Serialize;
pub use serde_with;
use utility::id::{HasId, Id};

pub mod coordinator;
pub mod notification;
pub mod queue;
pub mod station;
pub mod stats;
pub mod user;

pub trait ExampleData {
    fn example_data() -> Self;
}

/// Half-open range `[first, last)`.
#[derive(Debug, Clone)]
pub struct DateTimeRange<Tz>
where
    Tz: TimeZone,
{
    pub first: DateTime<Tz>,
    pub last: DateTime<Tz>,
}

impl<Tz: TimeZone> DateTimeRange<Tz> {
    pub fn new(first: DateTime<Tz>, last: DateTime<Tz>) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, moment: &DateTime<Tz>) -> bool {
        *moment >= self.first && *moment < self.last
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone,
{
    pub id: Id<V>,
    #[serde(flatten)]
    pub content: V,
}

impl<V> WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone,
{
    pub fn new(id: Id<V>, content: V) -> Self {
        Self { id, content }
    }
}

impl<V> ExampleData for WithId<V>
where
    V: HasId + ExampleData,
    V::IdType: Serialize + Debug + Clone + From<String>,
{
    fn example_data() -> Self {
        Self::new(
            Id::new("5f0c6a2e-8d1b-4c55-9a53-2b1f4c8e7d10".to_owned().into()),
            V::example_data(),
        )
    }
}
