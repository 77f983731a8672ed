use std::{error::Error as StdError, iter};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cafe_api_types::Rejection;
use thiserror::Error;

use crate::{
    application::coffee_rating::RatingError, bootstrap::BootstrapError, config::LoadError,
    domain::error::DomainError, infra::error::InfraError,
};

/// Diagnostic attached to error responses and consumed by `log_responses`.
/// `messages` holds the error followed by each of its sources.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let chain = iter::successors(Some(error), |&current| current.source())
            .map(ToString::to_string)
            .collect();
        Self::with_chain(source, status, chain)
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self::with_chain(source, status, vec![message.into()])
    }

    fn with_chain(source: &'static str, status: StatusCode, messages: Vec<String>) -> Self {
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Handler-level failure: the client sees `public_message`, the log sees the
/// report.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        ErrorReport::from_message(source, status, detail).into_http(public_message)
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        ErrorReport::from_error(source, status, error).into_http(public_message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ErrorReport {
    fn into_http(self, public_message: &'static str) -> HttpError {
        HttpError {
            status: self.status,
            public_message,
            report: self,
        }
    }
}

/// JSON body of a handler failure. The same value rides along as a response
/// extension so the error filter can re-shape it without parsing the body.
pub fn rejection_body(status: StatusCode, message: impl Into<String>) -> Rejection {
    Rejection {
        status_code: status.as_u16(),
        message: message.into(),
        error: status.canonical_reason().unwrap_or("Error").to_string(),
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = rejection_body(self.status, self.public_message);
        let mut response = (self.status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        self.report.attach(&mut response);
        response
    }
}

impl From<DomainError> for HttpError {
    fn from(error: DomainError) -> Self {
        match &error {
            DomainError::NotFound { .. } => HttpError::from_error(
                "application::error::domain_error",
                StatusCode::NOT_FOUND,
                "Resource not found",
                &error,
            ),
            DomainError::Validation { .. } => HttpError::from_error(
                "application::error::domain_error",
                StatusCode::BAD_REQUEST,
                "Request could not be processed",
                &error,
            ),
        }
    }
}

impl From<RatingError> for HttpError {
    fn from(error: RatingError) -> Self {
        match error {
            RatingError::Domain(err) => err.into(),
            RatingError::Repo(err) => {
                crate::infra::http::repo_error_to_http("application::coffee_rating", err)
            }
        }
    }
}

/// Top-level failure of the process; anything reaching `main` exits non-zero.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadError),
    #[error("startup aborted: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
