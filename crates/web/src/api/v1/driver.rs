use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Extension, Json, Router,
};
use model::{
    notification::Notification,
    queue::{DriverQueueStatus, NewQueueEntry, QueueEntry},
    station::Station,
    stats::DailyStats,
    user::Session,
    WithId,
};
use serde::Deserialize;
use transport_queue::database::Database;
use utility::id::Id;

use crate::{
    common::{on_error, route_not_found, ApiResponse, ApiResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/join-queue", post(join_queue::<D>))
        .route("/leave-queue", post(leave_queue::<D>))
        .route("/request-special", post(request_special::<D>))
        .route("/queue-status", get(queue_status::<D>))
        .route("/today-stats", get(today_stats::<D>))
        .route("/notifications", get(notifications::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinQueue {
    station_id: String,
    #[serde(flatten)]
    vehicle: NewQueueEntry,
}

async fn join_queue<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    Json(request): Json<JoinQueue>,
) -> ApiResult<WithId<QueueEntry>> {
    queue_client
        .join_queue(&session, &Id::new(request.station_id), request.vehicle)
        .await
        .map(|entry| {
            ApiResponse::ok(entry)
                .with_message("You joined the queue.")
                .json()
        })
        .map_err(on_error(&method, &original_uri))
}

/// Names the station when a driver is queued at more than one.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationSelector {
    station_id: Option<String>,
}

impl StationSelector {
    fn from_body(body: Option<Json<StationSelector>>) -> Option<Id<Station>> {
        body.and_then(|Json(selector)| selector.station_id)
            .map(Id::new)
    }
}

async fn leave_queue<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    body: Option<Json<StationSelector>>,
) -> ApiResult<()> {
    let station = StationSelector::from_body(body);
    queue_client
        .leave_queue(&session, station.as_ref())
        .await
        .map(|()| {
            ApiResponse::done()
                .with_message("You left the queue.")
                .json()
        })
        .map_err(on_error(&method, &original_uri))
}

async fn request_special<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    body: Option<Json<StationSelector>>,
) -> ApiResult<WithId<QueueEntry>> {
    let station = StationSelector::from_body(body);
    queue_client
        .driver_request_special(&session, station.as_ref())
        .await
        .map(|entry| ApiResponse::ok(entry).json())
        .map_err(on_error(&method, &original_uri))
}

async fn queue_status<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<Vec<DriverQueueStatus>> {
    queue_client
        .queue_status(&session)
        .await
        .map(|status| ApiResponse::ok(status).json())
        .map_err(on_error(&method, &original_uri))
}

async fn today_stats<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<DailyStats> {
    queue_client
        .today_stats(&session)
        .await
        .map(|stats| ApiResponse::ok(stats).json())
        .map_err(on_error(&method, &original_uri))
}

async fn notifications<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<Vec<WithId<Notification>>> {
    queue_client
        .notifications(&session)
        .await
        .map(|notifications| ApiResponse::ok(notifications).json())
        .map_err(on_error(&method, &original_uri))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_body_carries_station_and_vehicle() {
        let request: JoinQueue = serde_json::from_value(serde_json::json!({
            "stationId": "s1",
            "vehicleNumber": "b 123 abc",
            "route": "Gaborone - Mogoditshane",
            "destination": "Mogoditshane",
            "capacity": 15,
            "serviceType": "combi",
            "specialService": true,
        }))
        .unwrap();
        assert_eq!(request.station_id, "s1");
        assert_eq!(request.vehicle.capacity, 15);
        assert!(request.vehicle.special_request);
    }
}
