use async_trait::async_trait;
use chrono::{DateTime, Local};
use model::{
    coordinator::{CoordinatorProfile, WorkingHours},
    user::User,
    WithId,
};
use sqlx::{prelude::FromRow, types::Json};
use transport_queue::database::{CoordinatorRepo, Result};
use utility::id::{Id, IdWrapper};

use crate::{
    queries::{
        coordinator::{get_by_user, insert, update},
        to_unsigned,
    },
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct CoordinatorRow {
    pub id: String,
    pub user_id: String,
    pub stations: Vec<String>,
    pub specializations: Vec<String>,
    pub working_hours: Option<Json<WorkingHours>>,
    pub rating: f64,
    pub experience: i32,
    pub created_at: DateTime<Local>,
}

impl DatabaseRow for CoordinatorRow {
    type Model = CoordinatorProfile;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        Ok(CoordinatorProfile {
            user: Id::new(self.user_id),
            stations: self.stations.into_iter().map(Id::new).collect(),
            specializations: self.specializations,
            working_hours: self.working_hours.map(|hours| hours.0),
            rating: self.rating,
            experience: to_unsigned("experience", self.experience)?,
            created_at: self.created_at,
        })
    }

    fn from_model(profile: WithId<CoordinatorProfile>) -> Self {
        Self {
            id: profile.id.raw(),
            user_id: profile.content.user.raw(),
            stations: profile.content.stations.as_slice().raw(),
            specializations: profile.content.specializations,
            working_hours: profile.content.working_hours.map(Json),
            rating: profile.content.rating,
            experience: i32::try_from(profile.content.experience).unwrap_or(i32::MAX),
            created_at: profile.content.created_at,
        }
    }
}

#[async_trait]
impl CoordinatorRepo for PgDatabaseAutocommit {
    async fn insert_coordinator(
        &mut self,
        profile: WithId<CoordinatorProfile>,
    ) -> Result<WithId<CoordinatorProfile>> {
        insert(&self.pool, profile).await
    }

    async fn coordinator_by_user(&mut self, user: &Id<User>) -> Result<WithId<CoordinatorProfile>> {
        get_by_user(&self.pool, user).await
    }

    async fn update_coordinator(&mut self, profile: &WithId<CoordinatorProfile>) -> Result<()> {
        update(&self.pool, profile).await
    }
}

#[async_trait]
impl<'a> CoordinatorRepo for PgDatabaseTransaction<'a> {
    async fn insert_coordinator(
        &mut self,
        profile: WithId<CoordinatorProfile>,
    ) -> Result<WithId<CoordinatorProfile>> {
        insert(&mut *self.tx, profile).await
    }

    async fn coordinator_by_user(&mut self, user: &Id<User>) -> Result<WithId<CoordinatorProfile>> {
        get_by_user(&mut *self.tx, user).await
    }

    async fn update_coordinator(&mut self, profile: &WithId<CoordinatorProfile>) -> Result<()> {
        update(&mut *self.tx, profile).await
    }
}
