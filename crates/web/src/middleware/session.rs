use axum::{
    extract::{self, OriginalUri},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use model::user::{Role, Session};
use std::sync::Arc;

use crate::common::{RouteErrorResponse, RouteResult};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Reads the identity forwarded by the authenticating gateway.
///
/// Returns `Ok(None)` when no identity was forwarded at all and `Err` when
/// the headers are present but unusable.
pub fn session_from_headers(headers: &HeaderMap) -> Result<Option<Session>, String> {
    let user = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let role = headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok());

    match (user, role) {
        (None, None) => Ok(None),
        (Some(user), Some(role)) => {
            let role: Role = role.parse()?;
            Ok(Some(Session::new(user, role)))
        }
        _ => Err(format!(
            "both `{}` and `{}` are required",
            USER_ID_HEADER, USER_ROLE_HEADER
        )),
    }
}

/// The session of a route that can also be used anonymously.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<Arc<Session>>);

impl OptionalSession {
    pub fn as_deref(&self) -> Option<&Session> {
        self.0.as_deref()
    }

    pub fn require(&self, method: &Method, uri: &OriginalUri) -> RouteResult<Arc<Session>> {
        self.0
            .clone()
            .ok_or_else(|| RouteErrorResponse::unauthenticated(method, uri.path()))
    }
}

fn unauthenticated(req: &extract::Request, why: Option<String>) -> Response {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    if let Some(why) = why {
        log::debug!("rejected session for {}: {}", uri, why);
    }
    RouteErrorResponse::unauthenticated(req.method(), uri).into_response()
}

/// Rejects requests without a session with `401`, otherwise makes the
/// session available as `Extension<Arc<Session>>`.
pub async fn session_middleware(mut req: extract::Request, next: Next) -> Response {
    match session_from_headers(req.headers()) {
        Ok(Some(session)) => {
            req.extensions_mut().insert(Arc::new(session));
            next.run(req).await
        }
        Ok(None) => unauthenticated(&req, None),
        Err(why) => unauthenticated(&req, Some(why)),
    }
}

/// Makes the session, if any, available as `Extension<OptionalSession>`.
pub async fn optional_session_middleware(mut req: extract::Request, next: Next) -> Response {
    match session_from_headers(req.headers()) {
        Ok(session) => {
            req.extensions_mut()
                .insert(OptionalSession(session.map(Arc::new)));
            next.run(req).await
        }
        Err(why) => unauthenticated(&req, Some(why)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn reads_forwarded_identity() {
        let session = session_from_headers(&headers(&[
            (USER_ID_HEADER, "u-17"),
            (USER_ROLE_HEADER, "Coordinator"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(session, Session::coordinator("u-17"));
    }

    #[test]
    fn no_headers_means_anonymous() {
        assert_eq!(session_from_headers(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn partial_or_unknown_identity_is_rejected() {
        assert!(session_from_headers(&headers(&[(USER_ID_HEADER, "u-17")])).is_err());
        assert!(session_from_headers(&headers(&[
            (USER_ID_HEADER, "u-17"),
            (USER_ROLE_HEADER, "admin"),
        ]))
        .is_err());
        assert!(session_from_headers(&headers(&[
            (USER_ID_HEADER, "  "),
            (USER_ROLE_HEADER, "driver"),
        ]))
        .is_err());
    }
}
