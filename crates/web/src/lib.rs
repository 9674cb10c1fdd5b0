pub use crate::common::RouteResult;

use std::{net::SocketAddr, time::Duration};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use transport_queue::{client::Client, database::Database};

pub mod api;
pub mod common;
pub mod config;
pub mod middleware;

#[derive(Clone)]
pub struct WebState<D>
where
    D: Database,
{
    pub queue_client: Client<D>,
    /// Interval of the queue event stream.
    pub poll_interval: Duration,
}

impl<D> WebState<D>
where
    D: Database,
{
    pub fn new(queue_client: Client<D>, poll_interval: Duration) -> Self {
        Self {
            queue_client,
            poll_interval,
        }
    }
}

pub fn router<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state))
        .fallback(common::route_not_found)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server<D: Database>(
    state: WebState<D>,
    address: SocketAddr,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state).into_make_service()).await?;

    Ok(())
}
