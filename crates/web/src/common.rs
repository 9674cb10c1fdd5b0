use axum::{
    extract::{OriginalUri, Query, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use model::ExampleData;
use schemars::{schema_for, schema_for_value, JsonSchema};
use serde::{Deserialize, Serialize};
use transport_queue::RequestError;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type ApiResult<O> = RouteResult<Json<ApiResponse<O>>>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

/// The envelope every successful response is wrapped in.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn json(self) -> Json<Self> {
        Json(self)
    }
}

impl ApiResponse<()> {
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }
}

// - Services returning commonly used responses -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaParams {
    #[serde(default = "Default::default")]
    example_data: bool,
}

pub(crate) async fn schema<T: ExampleData + JsonSchema + Serialize>(
    Query(params): Query<SchemaParams>,
) -> impl IntoResponse {
    if params.example_data {
        Json(schema_for_value!(T::example_data()))
    } else {
        Json(schema_for!(T))
    }
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_uri: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            success: false,
            message: None,
            http_method: None,
            requested_uri: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn unauthenticated(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
            .with_method(method)
            .with_uri(uri)
            .with_message("Please sign in to continue.")
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = self
            .status_code
            .canonical_reason()
            .unwrap_or("i dunno what happened here :/");
        self.with_message(message)
    }
}

impl From<RequestError> for RouteErrorResponse {
    fn from(value: RequestError) -> Self {
        let status_code = match &value {
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::Unauthorized(_) => StatusCode::FORBIDDEN,
            RequestError::DuplicateActiveEntry { .. }
            | RequestError::IllegalTransition { .. }
            | RequestError::StationBusy { .. }
            | RequestError::StationFull { .. }
            | RequestError::StationInactive => StatusCode::CONFLICT,
            RequestError::InvalidMove(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::Invalid(_) => StatusCode::BAD_REQUEST,
            RequestError::Database(why) => {
                log::error!("request failed: {}", why);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR).with_default_message();
            }
        };
        Self::new(status_code).with_message(value.to_string())
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Turns a failed request into an error response that names the route.
pub(crate) fn on_error<'a>(
    method: &'a Method,
    uri: &'a OriginalUri,
) -> impl FnOnce(RequestError) -> RouteErrorResponse + 'a {
    move |why| {
        RouteErrorResponse::from(why)
            .with_method(method)
            .with_uri(uri.path())
    }
}
