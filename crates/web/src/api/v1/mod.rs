use axum::{routing::on, Router};
use transport_queue::database::Database;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    middleware::session::{optional_session_middleware, session_middleware},
    WebState,
};

mod coordinator;
mod coordinators;
mod driver;
mod events;
mod stations;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .nest_service(
            "/coordinator",
            coordinator::routes(state.clone())
                .layer(axum::middleware::from_fn(session_middleware)),
        )
        .nest_service(
            "/driver",
            driver::routes(state.clone()).layer(axum::middleware::from_fn(session_middleware)),
        )
        .nest_service(
            "/coordinators",
            coordinators::routes(state.clone())
                .layer(axum::middleware::from_fn(session_middleware)),
        )
        .nest_service(
            "/stations",
            stations::routes(state).layer(axum::middleware::from_fn(optional_session_middleware)),
        )
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
