use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cafe_api_types::ErrorEnvelope;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// A handler failure as seen by the error filter.
#[derive(Debug, Clone)]
pub struct HttpFailure {
    pub status: StatusCode,
    pub message: String,
    pub path: String,
}

/// Global translation of 4xx/5xx handler responses.
pub trait ErrorFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn translate(&self, failure: &HttpFailure) -> Response;
}

/// Re-shapes failures as `{statusCode, message, timestamp, path}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpErrorFilter;

impl HttpErrorFilter {
    pub fn envelope(failure: &HttpFailure, at: OffsetDateTime) -> ErrorEnvelope {
        ErrorEnvelope {
            status_code: failure.status.as_u16(),
            message: failure.message.clone(),
            timestamp: at.format(&Rfc3339).unwrap_or_else(|_| at.to_string()),
            path: failure.path.clone(),
        }
    }
}

impl ErrorFilter for HttpErrorFilter {
    fn name(&self) -> &'static str {
        "http-error-filter"
    }

    fn translate(&self, failure: &HttpFailure) -> Response {
        let body = Self::envelope(failure, OffsetDateTime::now_utc());
        (failure.status, Json(body)).into_response()
    }
}
