use std::error::Error;

use database::{DatabaseConnectionInfo, PgDatabase};
use tracing_subscriber::EnvFilter;
use transport_queue::{
    database::Database, jobs::ArchiveJob, memory::MemoryDatabase, server::Server,
};
use web::{
    config::{Storage, WebConfig},
    start_web_server, WebState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // request traces
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = WebConfig::from_env()?;

    match config.storage {
        Storage::Postgres => {
            let database_connection_info = DatabaseConnectionInfo::from_env()
                .ok_or("expected database connection info in env.")?;
            let database = PgDatabase::connect(database_connection_info).await?;
            serve(Server::new(database), config).await
        }
        Storage::Memory => {
            log::warn!("queue data is kept in memory and lost on shutdown");
            serve(Server::new(MemoryDatabase::new()), config).await
        }
    }
}

async fn serve<D: Database>(server: Server<D>, config: WebConfig) -> Result<(), Box<dyn Error>> {
    let archive_interval = config.archive_interval;
    let archive = server.job("archive", move || ArchiveJob::new(archive_interval));

    let state = WebState::new(server.client("REST API"), config.poll_interval);
    let result = start_web_server(state, config.bind_address).await;

    archive.abort();
    Ok(result?)
}
