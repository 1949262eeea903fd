use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eb_broker::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("missing X-Broker-API-Version header")]
    MissingApiVersion,

    #[error("this service plan requires client support for asynchronous service operations")]
    AsyncRequired,

    #[error("plan changes are not supported")]
    PlanChangeNotSupported,

    #[error("instance is gone")]
    Gone,

    #[error(transparent)]
    Broker(#[from] eb_broker::Error),
}

impl ApiError {
    /// Machine-readable error code, where the marketplace protocol defines one.
    fn code(&self) -> Option<&'static str> {
        match self {
            Self::AsyncRequired => Some("AsyncRequired"),
            Self::PlanChangeNotSupported => Some("PlanChangeNotSupported"),
            Self::Broker(eb_broker::Error::PolicyViolation(_)) => Some("InvalidParameters"),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingApiVersion => StatusCode::PRECONDITION_FAILED,
            Self::AsyncRequired | Self::PlanChangeNotSupported => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Gone => StatusCode::GONE,
            Self::Broker(e) => match e.kind() {
                ErrorKind::BadInput => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
                ErrorKind::Unimplemented => StatusCode::NOT_IMPLEMENTED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let needs_operator = matches!(&self, Self::Broker(e) if e.needs_operator());
            tracing::error!(error = %self, needs_operator, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = match (&self, self.code()) {
            (Self::Gone, _) => serde_json::json!({}),
            (_, Some(code)) => serde_json::json!({ "error": code, "description": self.to_string() }),
            (_, None) => serde_json::json!({ "description": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
