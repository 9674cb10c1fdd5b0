use std::{any::Any, fmt::Debug, panic::AssertUnwindSafe, time::Duration};

use async_trait::async_trait;
use chrono::Local;
use futures::FutureExt;
use tokio::{
    task::JoinHandle,
    time::{self, sleep},
};

use crate::{client::Client, database::Database, stats, RequestError};

const DEFAULT_TICK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Run again on the next tick.
    Continue,
    /// Run again once the given time has passed.
    ContinueAfter(Duration),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisionStrategy {
    /// Replace the job with a fresh one from its factory.
    Restart,
    /// Keep the job and try again after the backoff.
    Resume,
    Stop,
}

/// Periodic background work run against the queue database.
#[async_trait]
pub trait Job: Send {
    type Error: Debug;

    /// Used in log messages.
    fn name(&self) -> &str;

    async fn run<D: Database>(&mut self, client: &Client<D>) -> Result<Continuation, Self::Error>;

    /// Specifies how long to wait between calls to the `run` method.
    fn tick(&self) -> Option<Duration> {
        Some(DEFAULT_TICK)
    }

    /// Defines a backoff function, used to progressively increase the waiting
    /// time when consecutive failures happen.
    fn backoff(&self, last_backoff: Duration) -> Duration {
        last_backoff + self.tick().unwrap_or(DEFAULT_TICK)
    }

    /// Specifies the behavior if the job returns an error.
    fn on_error(&self, _error: Self::Error) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }

    /// Specifies the behavior if the job panics.
    fn on_panic(&self, _error: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Restart
    }
}

pub struct JobHandle {
    handle: JoinHandle<()>,
}

impl JobHandle {
    pub fn abort(&self) {
        self.handle.abort()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits until the job exits or is stopped by its supervision strategy.
    pub async fn join(self) {
        if let Err(why) = self.handle.await {
            if !why.is_cancelled() {
                log::error!("job task failed: {}", why);
            }
        }
    }
}

/// Spawns a job onto the runtime and supervises it.
pub fn spawn<D, J, F>(factory: F, client: Client<D>) -> JobHandle
where
    D: Database,
    J: Job + 'static,
    J::Error: Send,
    F: 'static + Send + Fn() -> J,
{
    let handle = tokio::spawn(async move {
        let mut job = factory();
        let mut interval = job.tick().map(time::interval);
        let mut backoff = job.tick().unwrap_or(DEFAULT_TICK);
        loop {
            // the first tick completes immediately
            if let Some(tick) = &mut interval {
                tick.tick().await;
            }

            let result = AssertUnwindSafe(job.run(&client)).catch_unwind().await;
            let result = match result {
                Ok(Ok(continuation)) => Ok(continuation),
                Ok(Err(why)) => {
                    log::error!("job {} failed: {:?}", job.name(), why);
                    Err(job.on_error(why))
                }
                Err(why) => {
                    log::error!("job {} panicked", job.name());
                    Err(job.on_panic(why))
                }
            };

            match result {
                Ok(Continuation::Continue) => {}
                Ok(Continuation::ContinueAfter(delay)) => {
                    sleep(delay).await;
                    if let Some(tick) = &mut interval {
                        tick.reset_immediately();
                    }
                }
                Ok(Continuation::Exit) => {
                    log::info!("job {} finished", job.name());
                    break;
                }
                Err(SupervisionStrategy::Stop) => {
                    log::warn!("job {} stopped", job.name());
                    break;
                }
                Err(strategy) => {
                    if strategy == SupervisionStrategy::Restart {
                        job = factory();
                    }
                    backoff = job.backoff(backoff);
                    sleep(backoff).await;
                    continue;
                }
            }
            backoff = job.tick().unwrap_or(DEFAULT_TICK);
        }
    });
    JobHandle { handle }
}

/// Archives the entries that ended before the current local day.
pub struct ArchiveJob {
    tick: Duration,
}

impl ArchiveJob {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }
}

#[async_trait]
impl Job for ArchiveJob {
    type Error = RequestError;

    fn name(&self) -> &str {
        "archive"
    }

    async fn run<D: Database>(&mut self, client: &Client<D>) -> Result<Continuation, Self::Error> {
        let cutoff = stats::start_of_day(Local::now().date_naive());
        client.archive(cutoff).await?;
        Ok(Continuation::Continue)
    }

    fn tick(&self) -> Option<Duration> {
        Some(self.tick)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use crate::{memory::MemoryDatabase, server::Server};

    use super::*;

    struct Flaky {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Job for Flaky {
        type Error = String;

        fn name(&self) -> &str {
            "flaky"
        }

        async fn run<D: Database>(&mut self, _client: &Client<D>) -> Result<Continuation, String> {
            match self.runs.fetch_add(1, Ordering::SeqCst) {
                0 => panic!("first run"),
                1 => Err("second run".to_owned()),
                2 => Ok(Continuation::Continue),
                _ => Ok(Continuation::Exit),
            }
        }

        fn tick(&self) -> Option<Duration> {
            Some(Duration::from_millis(5))
        }
    }

    #[tokio::test]
    async fn survives_panics_and_errors_until_exit() {
        let server = Server::new(MemoryDatabase::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = server.job("flaky", move || Flaky {
            runs: counter.clone(),
        });

        time::timeout(Duration::from_secs(5), handle.join())
            .await
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    struct Stopping;

    #[async_trait]
    impl Job for Stopping {
        type Error = String;

        fn name(&self) -> &str {
            "stopping"
        }

        async fn run<D: Database>(&mut self, _client: &Client<D>) -> Result<Continuation, String> {
            Err("broken".to_owned())
        }

        fn on_error(&self, _error: String) -> SupervisionStrategy {
            SupervisionStrategy::Stop
        }
    }

    #[tokio::test]
    async fn stop_strategy_ends_the_job() {
        let server = Server::new(MemoryDatabase::new());
        let handle = server.job("stopping", || Stopping);
        time::timeout(Duration::from_secs(5), handle.join())
            .await
            .unwrap();
    }
}
