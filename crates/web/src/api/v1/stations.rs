use axum::{
    extract::{OriginalUri, Path, State},
    http::Method,
    routing::{get, on, post},
    Extension, Json, Router,
};
use model::{
    station::{NewStation, Station, StationPatch},
    WithId,
};
use transport_queue::database::Database;
use utility::id::Id;

use crate::{
    common::{on_error, route_not_found, schema, ApiResponse, ApiResult, METHOD_FILTER_ALL},
    middleware::session::OptionalSession,
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<Station>))
        .route("/", get(get_stations::<D>).post(register_station::<D>))
        .route("/:id", get(get_station::<D>).patch(update_station::<D>))
        .route("/:id/deactivate", post(deactivate_station::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_stations<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<OptionalSession>,
) -> ApiResult<Vec<WithId<Station>>> {
    queue_client
        .get_stations(session.as_deref())
        .await
        .map(|stations| ApiResponse::ok(stations).json())
        .map_err(on_error(&method, &original_uri))
}

async fn get_station<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
) -> ApiResult<WithId<Station>> {
    queue_client
        .get_station(&Id::new(id))
        .await
        .map(|station| ApiResponse::ok(station).json())
        .map_err(on_error(&method, &original_uri))
}

async fn register_station<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<OptionalSession>,
    Json(station): Json<NewStation>,
) -> ApiResult<WithId<Station>> {
    let session = session.require(&method, &original_uri)?;
    queue_client
        .register_station(&session, station)
        .await
        .map(|station| {
            ApiResponse::ok(station)
                .with_message("Station registered.")
                .json()
        })
        .map_err(on_error(&method, &original_uri))
}

async fn update_station<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<OptionalSession>,
    Json(patch): Json<StationPatch>,
) -> ApiResult<WithId<Station>> {
    let session = session.require(&method, &original_uri)?;
    queue_client
        .update_station(&session, &Id::new(id), patch)
        .await
        .map(|station| ApiResponse::ok(station).json())
        .map_err(on_error(&method, &original_uri))
}

async fn deactivate_station<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<OptionalSession>,
) -> ApiResult<WithId<Station>> {
    let session = session.require(&method, &original_uri)?;
    queue_client
        .deactivate_station(&session, &Id::new(id))
        .await
        .map(|station| {
            ApiResponse::ok(station)
                .with_message("Station deactivated.")
                .json()
        })
        .map_err(on_error(&method, &original_uri))
}
