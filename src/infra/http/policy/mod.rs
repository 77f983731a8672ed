//! Cross-cutting request policies: one guard, one interceptor and one error
//! filter at most, selected at composition time and applied to every route.

mod filter;
mod guard;
mod interceptor;

pub use filter::{ErrorFilter, HttpErrorFilter, HttpFailure};
pub use guard::{Guard, GuardDecision, PublicGuard, RequestMeta};
pub use interceptor::{Interceptor, WrapResponseInterceptor};

use std::{fmt, sync::Arc};

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{MatchedPath, Request, State},
    http::{
        StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use cafe_api_types::Rejection;
use metrics::counter;
use serde_json::Value;

use crate::{
    application::error::{ErrorReport, HttpError, rejection_body},
    config::PolicySettings,
    infra::telemetry::{
        ERROR_FILTER_APPLIED_TOTAL, GUARD_ALLOWED_TOTAL, GUARD_DENIED_TOTAL,
        INTERCEPTOR_APPLIED_TOTAL,
    },
};

use super::routes::RouteTable;

const SOURCE: &str = "infra::http::policy";
const FORBIDDEN_MESSAGE: &str = "Forbidden resource";

/// The globally registered policy implementations.
#[derive(Clone, Default)]
pub struct PolicyRegistry {
    guard: Option<Arc<dyn Guard>>,
    interceptor: Option<Arc<dyn Interceptor>>,
    error_filter: Option<Arc<dyn ErrorFilter>>,
}

impl PolicyRegistry {
    /// An empty registry; every request passes through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &PolicySettings) -> Self {
        let mut registry = Self::new();
        if settings.guard {
            registry = registry.with_guard(Arc::new(PublicGuard::new(settings.api_key.clone())));
        }
        if settings.interceptor {
            registry = registry.with_interceptor(Arc::new(WrapResponseInterceptor));
        }
        if settings.error_filter {
            registry = registry.with_error_filter(Arc::new(HttpErrorFilter));
        }
        registry
    }

    /// Registers the guard, replacing any previous one.
    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn with_error_filter(mut self, filter: Arc<dyn ErrorFilter>) -> Self {
        self.error_filter = Some(filter);
        self
    }

    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            guard: self.guard.as_ref().map(|guard| guard.name()),
            interceptor: self.interceptor.as_ref().map(|interceptor| interceptor.name()),
            error_filter: self.error_filter.as_ref().map(|filter| filter.name()),
        }
    }
}

impl fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.summary().fmt(f)
    }
}

/// Names of the active policy implementations, `None` for an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySummary {
    pub guard: Option<&'static str>,
    pub interceptor: Option<&'static str>,
    pub error_filter: Option<&'static str>,
}

impl fmt::Display for PolicySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "guard={} interceptor={} error_filter={}",
            self.guard.unwrap_or("none"),
            self.interceptor.unwrap_or("none"),
            self.error_filter.unwrap_or("none")
        )
    }
}

/// State for [`enforce_policies`].
#[derive(Clone)]
pub struct PolicyState {
    pub registry: PolicyRegistry,
    pub routes: Arc<RouteTable>,
}

/// Runs guard → handler → interceptor / error filter for one request.
pub async fn enforce_policies(
    State(state): State<PolicyState>,
    request: Request,
    next: Next,
) -> Response {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    if let Some(guard) = state.registry.guard.as_ref() {
        let access = matched_path
            .as_deref()
            .and_then(|path| state.routes.access(request.method(), path));
        let meta = RequestMeta {
            method: request.method().clone(),
            matched_path,
            headers: request.headers().clone(),
            access,
        };

        match guard.evaluate(&meta).await {
            GuardDecision::Allow => counter!(GUARD_ALLOWED_TOTAL).increment(1),
            GuardDecision::Deny => {
                counter!(GUARD_DENIED_TOTAL).increment(1);
                return forbidden(guard.name());
            }
        }
    }

    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let status = response.status();

    if status.is_success() {
        match state.registry.interceptor.as_ref() {
            Some(interceptor) => intercept(interceptor.as_ref(), response).await,
            None => response,
        }
    } else if status.is_client_error() || status.is_server_error() {
        match state.registry.error_filter.as_ref() {
            Some(filter) => translate(filter.as_ref(), response, path),
            None => response,
        }
    } else {
        response
    }
}

fn forbidden(guard: &'static str) -> Response {
    let status = StatusCode::FORBIDDEN;
    let mut response = (status, Json(rejection_body(status, FORBIDDEN_MESSAGE))).into_response();
    ErrorReport::from_message(SOURCE, status, format!("request denied by `{guard}`"))
        .attach(&mut response);
    response
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

async fn intercept(interceptor: &dyn Interceptor, response: Response) -> Response {
    if !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Response could not be produced",
                &err,
            )
            .into_response();
        }
    };

    let value = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => value,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    match serde_json::to_vec(&interceptor.transform(value)) {
        Ok(wrapped) => {
            counter!(INTERCEPTOR_APPLIED_TOTAL).increment(1);
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(wrapped))
        }
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Response could not be produced",
            &err,
        )
        .into_response(),
    }
}

fn translate(filter: &dyn ErrorFilter, response: Response, path: String) -> Response {
    let (parts, _body) = response.into_parts();
    let message = parts
        .extensions
        .get::<Rejection>()
        .map(|rejection| rejection.message.clone())
        .unwrap_or_else(|| {
            parts
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string()
        });
    let failure = HttpFailure {
        status: parts.status,
        message,
        path,
    };

    let mut translated = filter.translate(&failure);
    translated.extensions_mut().extend(parts.extensions);
    counter!(ERROR_FILTER_APPLIED_TOTAL).increment(1);
    translated
}
