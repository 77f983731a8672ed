mod middleware;
pub mod policy;
pub mod routes;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use policy::{PolicyRegistry, PolicySummary};
pub use routes::{Access, FeatureBuilder, FeatureModule, RouteConflict, RouteSpec, RouteTable};

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::application::{
    error::{ErrorReport, HttpError},
    repos::RepoError,
};

/// 204 when every probe answered, 503 with the first failure attached otherwise.
pub fn health_response(results: Vec<(&'static str, Result<(), RepoError>)>) -> Response {
    let failure = results
        .into_iter()
        .find_map(|(name, result)| result.err().map(|err| (name, err)));

    match failure {
        None => StatusCode::NO_CONTENT.into_response(),
        Some((name, err)) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            let mut report =
                ErrorReport::from_error("infra::http::health", StatusCode::SERVICE_UNAVAILABLE, &err);
            report.messages.insert(0, format!("{name} datastore unhealthy"));
            report.attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error response.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Unavailable(message) => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Datastore unavailable",
            message,
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

/// Merge the feature routers and wrap them in the global middleware stack.
///
/// Outermost first: request context, response logging, policies, panic
/// catcher. Route conflicts are reported before any router is merged.
pub fn build_router(
    features: Vec<FeatureModule>,
    policies: PolicyRegistry,
) -> Result<(Router, RouteTable), RouteConflict> {
    let table = RouteTable::from_features(&features)?;

    let router = features
        .into_iter()
        .fold(Router::new(), |router, feature| router.merge(feature.router));

    let state = policy::PolicyState {
        registry: policies,
        routes: Arc::new(table.clone()),
    };

    let router = router
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(from_fn_with_state(state, policy::enforce_policies))
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context));

    Ok((router, table))
}
