use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{delete, get, on, post, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use model::{
    queue::{MoveDirection, NewQueueEntry, QueueEntry, QueueSnapshot, QueueStatus},
    stats::DailyStats,
    user::Session,
    WithId,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use transport_queue::{database::Database, dispatch::Action, RequestError};
use utility::id::Id;

use crate::{
    common::{on_error, route_not_found, schema, ApiResponse, ApiResult, METHOD_FILTER_ALL},
    WebState,
};

use super::events;

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/queue/schema", get(schema::<QueueEntry>))
        .route("/queue/:station_id", get(get_queue::<D>))
        .route("/queue/:station_id/snapshot", get(get_snapshot::<D>))
        .route("/queue/:station_id/stats", get(get_stats::<D>))
        .route("/queue/:station_id/events", get(events::queue_events::<D>))
        .route("/queue/:station_id/add", post(add_vehicle::<D>))
        .route("/queue/:station_id/update", put(update_status::<D>))
        .route("/queue/:station_id/move", put(move_vehicle::<D>))
        .route("/queue/:station_id/:entry_id", delete(remove_vehicle::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn get_queue<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(station_id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<Vec<WithId<QueueEntry>>> {
    queue_client
        .station_queue(&session, &Id::new(station_id))
        .await
        .map(|entries| ApiResponse::ok(entries).json())
        .map_err(on_error(&method, &original_uri))
}

async fn get_snapshot<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(station_id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<QueueSnapshot> {
    queue_client
        .snapshot(&session, &Id::new(station_id))
        .await
        .map(|snapshot| ApiResponse::ok(snapshot).json())
        .map_err(on_error(&method, &original_uri))
}

#[derive(Deserialize)]
struct StatsQuery {
    date: Option<NaiveDate>,
}

async fn get_stats<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(station_id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    Query(params): Query<StatsQuery>,
) -> ApiResult<DailyStats> {
    queue_client
        .station_stats(&session, &Id::new(station_id), params.date)
        .await
        .map(|stats| ApiResponse::ok(stats).json())
        .map_err(on_error(&method, &original_uri))
}

async fn add_vehicle<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(station_id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    Json(entry): Json<NewQueueEntry>,
) -> ApiResult<WithId<QueueEntry>> {
    queue_client
        .enqueue(&session, &Id::new(station_id), entry)
        .await
        .map(|entry| {
            ApiResponse::ok(entry)
                .with_message("Vehicle added to the queue.")
                .json()
        })
        .map_err(on_error(&method, &original_uri))
}

/// Status change as sent by the dashboard. The client also sends a
/// `timestamp`, which is ignored in favour of the server clock.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate {
    vehicle_id: String,
    status: String,
    #[serde(default)]
    extra: Map<String, Value>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl StatusUpdate {
    fn reason(&self) -> Option<String> {
        ["reason", "knockOffReason"]
            .into_iter()
            .find_map(|key| {
                self.extra
                    .get(key)
                    .or_else(|| self.rest.get(key))
                    .and_then(Value::as_str)
            })
            .map(str::to_owned)
    }

    fn action(&self) -> Result<Action, RequestError> {
        let status: QueueStatus = self.status.parse().map_err(RequestError::Invalid)?;
        Action::from_target_status(status, self.reason())
    }
}

async fn update_status<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(station_id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<WithId<QueueEntry>> {
    let action = update.action().map_err(on_error(&method, &original_uri))?;
    queue_client
        .transition(
            &session,
            &Id::new(station_id),
            &Id::new(update.vehicle_id),
            action,
        )
        .await
        .map(|entry| ApiResponse::ok(entry).json())
        .map_err(on_error(&method, &original_uri))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest {
    vehicle_id: String,
    direction: MoveDirection,
}

async fn move_vehicle<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path(station_id): Path<String>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    Json(request): Json<MoveRequest>,
) -> ApiResult<Vec<WithId<QueueEntry>>> {
    queue_client
        .reorder(
            &session,
            &Id::new(station_id),
            &Id::new(request.vehicle_id),
            request.direction,
        )
        .await
        .map(|waiting| ApiResponse::ok(waiting).json())
        .map_err(on_error(&method, &original_uri))
}

async fn remove_vehicle<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    Path((station_id, entry_id)): Path<(String, String)>,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<()> {
    queue_client
        .remove(&session, &Id::new(station_id), &Id::new(entry_id))
        .await
        .map(|()| ApiResponse::done().json())
        .map_err(on_error(&method, &original_uri))
}
