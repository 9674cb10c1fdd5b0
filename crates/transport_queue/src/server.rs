use crate::{
    client::Client,
    database::Database,
    jobs::{self, Job, JobHandle},
};

pub struct Server<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    database: D,
}

impl<D> Server<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self { database }
    }

    /// A gateway client. The name shows up in log messages.
    pub fn client<S: Into<String>>(&self, name: S) -> Client<D> {
        Client::new(name, self.database.clone())
    }

    pub fn job<S, J, F>(&self, name: S, factory: F) -> JobHandle
    where
        S: Into<String>,
        J: Job + 'static,
        J::Error: Send,
        F: 'static + Send + Fn() -> J,
    {
        jobs::spawn(factory, self.client(name))
    }
}
