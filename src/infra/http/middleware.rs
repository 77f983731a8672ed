use std::{any::Any, time::Instant};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::{ErrorReport, HttpError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request identity, available to handlers and echoed to the client.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let context = RequestContext::generate();
    let header = HeaderValue::from_str(&context.request_id).ok();
    request.extensions_mut().insert(context.clone());

    let mut response = next.run(request).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response.extensions_mut().insert(context);
    response
}

struct Failure {
    source: &'static str,
    detail: String,
    chain: Vec<String>,
}

impl Failure {
    fn take(response: &mut Response) -> Self {
        match response.extensions_mut().remove::<ErrorReport>() {
            Some(report) => Self {
                source: report.source,
                detail: report
                    .messages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "no diagnostic available".to_string()),
                chain: report.messages,
            },
            None => Self {
                source: "unknown",
                detail: "no diagnostic available".to_string(),
                chain: Vec::new(),
            },
        }
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_default();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|context| context.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis();

    if response.status().is_server_error() {
        let failure = Failure::take(&mut response);
        error!(
            target = "cafe::http::response",
            status,
            %method,
            %path,
            %route,
            elapsed_ms,
            source = failure.source,
            detail = %failure.detail,
            chain = ?failure.chain,
            %request_id,
            "request failed",
        );
    } else if response.status().is_client_error() {
        let failure = Failure::take(&mut response);
        warn!(
            target = "cafe::http::response",
            status,
            %method,
            %path,
            %route,
            elapsed_ms,
            source = failure.source,
            detail = %failure.detail,
            %request_id,
            "request rejected",
        );
    } else {
        debug!(
            target = "cafe::http::response",
            status,
            %method,
            %path,
            elapsed_ms,
            %request_id,
            "request completed",
        );
    }

    response
}

/// Turns a handler panic into a 500 response carrying the panic message.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|message| (*message).to_owned()))
        .unwrap_or_else(|| "handler panicked".to_owned());

    HttpError::new(
        "infra::http::panic",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        detail,
    )
    .into_response()
}
