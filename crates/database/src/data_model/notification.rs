use async_trait::async_trait;
use chrono::{DateTime, Local};
use model::{notification::Notification, user::User, WithId};
use sqlx::prelude::FromRow;
use transport_queue::database::{NotificationRepo, Result, NOTIFICATION_HISTORY};
use utility::id::{Id, IdWrapper};

use crate::{
    queries::{
        notification::{get_by_recipient, insert, prune},
        parse_column,
    },
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: String,
    pub recipient: String,
    pub station_id: Option<String>,
    pub entry_id: Option<String>,
    pub kind: String,
    pub message: String,
    pub created_at: DateTime<Local>,
}

impl DatabaseRow for NotificationRow {
    type Model = Notification;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        Ok(Notification {
            recipient: Id::new(self.recipient),
            station_id: self.station_id.map(Id::new),
            entry_id: self.entry_id.map(Id::new),
            kind: parse_column("kind", &self.kind)?,
            message: self.message,
            created_at: self.created_at,
        })
    }

    fn from_model(notification: WithId<Notification>) -> Self {
        Self {
            id: notification.id.raw(),
            recipient: notification.content.recipient.raw(),
            station_id: notification.content.station_id.raw(),
            entry_id: notification.content.entry_id.raw(),
            kind: notification.content.kind.as_str().to_owned(),
            message: notification.content.message,
            created_at: notification.content.created_at,
        }
    }
}

#[async_trait]
impl NotificationRepo for PgDatabaseAutocommit {
    async fn push_notification(&mut self, notification: WithId<Notification>) -> Result<()> {
        let recipient = notification.content.recipient.clone();
        insert(&self.pool, notification).await?;
        prune(&self.pool, &recipient, NOTIFICATION_HISTORY).await?;
        Ok(())
    }

    async fn get_notifications(
        &mut self,
        recipient: &Id<User>,
        limit: u32,
    ) -> Result<Vec<WithId<Notification>>> {
        get_by_recipient(&self.pool, recipient, limit).await
    }
}

#[async_trait]
impl<'a> NotificationRepo for PgDatabaseTransaction<'a> {
    async fn push_notification(&mut self, notification: WithId<Notification>) -> Result<()> {
        let recipient = notification.content.recipient.clone();
        insert(&mut *self.tx, notification).await?;
        prune(&mut *self.tx, &recipient, NOTIFICATION_HISTORY).await?;
        Ok(())
    }

    async fn get_notifications(
        &mut self,
        recipient: &Id<User>,
        limit: u32,
    ) -> Result<Vec<WithId<Notification>>> {
        get_by_recipient(&mut *self.tx, recipient, limit).await
    }
}
