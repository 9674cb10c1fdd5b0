use axum::{
    extract::{OriginalUri, Path, State},
    http::Method,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use axum_extra::TypedHeader;
use futures::stream::{self, Stream};
use model::user::Session;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::StreamExt as _;
use transport_queue::{database::Database, RequestError};
use utility::id::Id;

use crate::{
    common::{on_error, RouteResult},
    WebState,
};

/// Pushes the partitioned queue of a station once per poll interval.
///
/// Authority is checked before the stream starts, so a coordinator of another
/// station gets a regular error response instead of an empty stream.
pub(crate) async fn queue_events<D: Database>(
    method: Method,
    original_uri: OriginalUri,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    Path(station_id): Path<String>,
    State(WebState {
        queue_client,
        poll_interval,
    }): State<WebState<D>>,
    Extension(session): Extension<Arc<Session>>,
) -> RouteResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let station_id = Id::new(station_id);
    queue_client
        .snapshot(&session, &station_id)
        .await
        .map_err(on_error(&method, &original_uri))?;

    log::debug!(
        "`{}` subscribed to station {} as {}",
        user_agent
            .as_ref()
            .map(|TypedHeader(agent)| agent.as_str())
            .unwrap_or("unknown client"),
        station_id,
        session.user
    );

    let stream = stream::unfold((), move |()| {
        let client = queue_client.clone();
        let session = session.clone();
        let station_id = station_id.clone();
        async move {
            let event = match client.snapshot(&session, &station_id).await {
                Ok(snapshot) => Event::default()
                    .event("snapshot")
                    .json_data(snapshot)
                    .unwrap_or_else(|why| error_event(why.to_string())),
                Err(why) => error_event(message_of(why)),
            };
            Some((event, ()))
        }
    })
    .map(Ok)
    .throttle(poll_interval);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn error_event(message: String) -> Event {
    Event::default().event("error").data(message)
}

fn message_of(why: RequestError) -> String {
    match why {
        RequestError::Database(why) => {
            log::error!("queue event stream failed: {}", why);
            "The queue is currently unavailable.".to_owned()
        }
        other => other.to_string(),
    }
}
