use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Extension, Json, Router,
};
use model::{
    coordinator::{CoordinatorProfile, CoordinatorRegistration},
    user::Session,
    WithId,
};
use transport_queue::database::Database;

use crate::{
    common::{on_error, route_not_found, ApiResponse, ApiResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", post(register_coordinator::<D>))
        .route("/me", get(get_profile::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn register_coordinator<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
    Json(registration): Json<CoordinatorRegistration>,
) -> ApiResult<WithId<CoordinatorProfile>> {
    queue_client
        .register_coordinator(&session, registration)
        .await
        .map(|profile| ApiResponse::ok(profile).json())
        .map_err(on_error(&method, &original_uri))
}

async fn get_profile<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    State(WebState { queue_client, .. }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> ApiResult<WithId<CoordinatorProfile>> {
    queue_client
        .coordinator_profile(&session)
        .await
        .map(|profile| ApiResponse::ok(profile).json())
        .map_err(on_error(&method, &original_uri))
}
