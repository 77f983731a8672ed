mod support;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header::AUTHORIZATION},
};
use cafe::{
    bootstrap::{self, Application, Datastores, DocumentHandle, PrimaryHandle, SecondaryHandle},
    infra::http::{
        self, Access, FeatureBuilder, REQUEST_ID_HEADER,
        policy::{
            Guard, GuardDecision, HttpErrorFilter, Interceptor, PolicyRegistry, PublicGuard,
            RequestMeta, WrapResponseInterceptor,
        },
    },
};
use serde_json::{Value, json};
use support::{
    API_KEY, EventLog, MemoryDocument, MemoryPrimary, MemorySecondary, body_json, datastores, get,
    json_request, settings,
};
use tower::ServiceExt;

fn standard_policies(error_filter: bool) -> PolicyRegistry {
    let registry = PolicyRegistry::new()
        .with_guard(Arc::new(PublicGuard::new(Some(API_KEY.to_string()))))
        .with_interceptor(Arc::new(WrapResponseInterceptor));
    if error_filter {
        registry.with_error_filter(Arc::new(HttpErrorFilter))
    } else {
        registry
    }
}

fn app(datastores: &Datastores, policies: PolicyRegistry) -> Application {
    bootstrap::compose(settings(), datastores, policies).expect("composed application")
}

struct RecordingGuard {
    events: EventLog,
    decision: GuardDecision,
}

#[async_trait]
impl Guard for RecordingGuard {
    fn name(&self) -> &'static str {
        "recording-guard"
    }

    async fn evaluate(&self, meta: &RequestMeta) -> GuardDecision {
        self.events.push(format!(
            "guard:{}",
            meta.matched_path.as_deref().unwrap_or("<none>")
        ));
        self.decision
    }
}

struct RecordingInterceptor {
    events: EventLog,
}

impl Interceptor for RecordingInterceptor {
    fn name(&self) -> &'static str {
        "recording-interceptor"
    }

    fn transform(&self, value: Value) -> Value {
        self.events.push("interceptor");
        WrapResponseInterceptor.transform(value)
    }
}

fn recording_policies(events: &EventLog, decision: GuardDecision) -> PolicyRegistry {
    PolicyRegistry::new()
        .with_guard(Arc::new(RecordingGuard {
            events: events.clone(),
            decision,
        }))
        .with_interceptor(Arc::new(RecordingInterceptor {
            events: events.clone(),
        }))
}

#[tokio::test]
async fn public_route_is_allowed_without_credentials_and_wrapped() {
    let stores = datastores(MemoryPrimary::new().with_coffee("Roast", "Buddy Brew"));
    let app = app(&stores, standard_policies(false));

    let response = app.router().oneshot(get("/coffees")).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["name"], "Roast");
    assert_eq!(body["data"][0]["brand"], "Buddy Brew");
    assert_eq!(body.as_object().map(|o| o.len()), Some(1));
}

#[tokio::test]
async fn guard_then_handler_then_interceptor_each_once() {
    let events = EventLog::default();
    let stores = datastores(MemoryPrimary::new().with_events(events.clone()));
    let app = app(&stores, recording_policies(&events, GuardDecision::Allow));

    let response = app.router().oneshot(get("/coffees")).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        events.events(),
        vec!["guard:/coffees", "handler", "interceptor"]
    );
}

#[tokio::test]
async fn denied_request_never_reaches_handler_or_interceptor() {
    let events = EventLog::default();
    let stores = datastores(MemoryPrimary::new().with_events(events.clone()));
    let app = app(&stores, recording_policies(&events, GuardDecision::Deny));

    let response = app.router().oneshot(get("/coffees")).await.expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({ "statusCode": 403, "message": "Forbidden resource", "error": "Forbidden" })
    );
    assert_eq!(events.events(), vec!["guard:/coffees"]);
}

#[tokio::test]
async fn protected_route_requires_api_key() {
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, standard_policies(false));
    let payload = json!({ "name": "Shipwreck", "brand": "Buddy Brew", "flavors": ["chocolate"] });

    let denied = app
        .router()
        .oneshot(json_request("POST", "/coffees", payload.clone(), None))
        .await
        .expect("response");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let wrong_key = app
        .router()
        .oneshot(json_request("POST", "/coffees", payload.clone(), Some("nope")))
        .await
        .expect("response");
    assert_eq!(wrong_key.status(), StatusCode::FORBIDDEN);

    let listed = body_json(app.router().oneshot(get("/coffees")).await.expect("response")).await;
    assert_eq!(listed["data"], json!([]));

    let created = app
        .router()
        .oneshot(json_request("POST", "/coffees", payload, Some(API_KEY)))
        .await
        .expect("response");
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_json(created).await;
    assert_eq!(body["data"]["name"], "Shipwreck");
    assert_eq!(body["data"]["flavors"], json!(["chocolate"]));
}

#[tokio::test]
async fn raw_api_key_header_is_accepted() {
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, standard_policies(false));

    let request = axum::http::Request::builder()
        .uri("/database/status")
        .header(AUTHORIZATION, API_KEY)
        .body(axum::body::Body::empty())
        .expect("request");
    let response = app.router().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "data": { "engine": "mysql", "reachable": true } })
    );
}

#[tokio::test]
async fn handler_errors_pass_through_without_error_filter() {
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, standard_policies(false));

    let response = app
        .router()
        .oneshot(get("/coffees/999"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "statusCode": 404, "message": "Resource not found", "error": "Not Found" })
    );
}

#[tokio::test]
async fn error_filter_translates_handler_errors_when_registered() {
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, standard_policies(true));

    let response = app
        .router()
        .oneshot(get("/coffees/999"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "Resource not found");
    assert_eq!(body["path"], "/coffees/999");
    assert!(body["timestamp"].as_str().is_some_and(|ts| ts.contains('T')));
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn unmatched_route_is_allowed_through_to_not_found() {
    let events = EventLog::default();
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, recording_policies(&events, GuardDecision::Allow));

    let response = app.router().oneshot(get("/teapots")).await.expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(events.events(), vec!["guard:<none>"]);
}

#[tokio::test]
async fn empty_registry_leaves_responses_untouched() {
    let stores = datastores(MemoryPrimary::new().with_coffee("Roast", "Buddy Brew"));
    let app = app(&stores, PolicyRegistry::new());

    let response = app.router().oneshot(get("/coffees")).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], "Roast");
}

#[tokio::test]
async fn handler_panic_becomes_internal_server_error() {
    let stores = Datastores {
        primary: PrimaryHandle::new(MemoryPrimary::new()),
        secondary: SecondaryHandle::new(MemorySecondary { reachable: true }),
        document: DocumentHandle::new(MemoryDocument::panicking()),
    };
    let app = app(&stores, standard_policies(false));

    let response = app.router().oneshot(get("/cats")).await.expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["statusCode"], 500);

    let after = app.router().oneshot(get("/coffees")).await.expect("response");
    assert_eq!(after.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, standard_policies(false));

    let response = app.router().oneshot(get("/coffees")).await.expect("response");

    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .expect("request id header");
    assert_eq!(request_id.len(), 36);
}

async fn vault(State(events): State<EventLog>) -> Json<Value> {
    events.push("handler");
    Json(json!({ "secret": true }))
}

fn head(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::HEAD).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
    }
    builder.body(Body::empty()).expect("request")
}

#[tokio::test]
async fn head_on_protected_get_route_is_guarded() {
    let events = EventLog::default();
    let feature = FeatureBuilder::new("vault")
        .get("/vault", Access::Protected, vault)
        .with_state(events.clone());
    let (router, _) =
        http::build_router(vec![feature], standard_policies(false)).expect("router");

    let denied = router
        .clone()
        .oneshot(head("/vault", None))
        .await
        .expect("response");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    assert!(events.events().is_empty());

    let allowed = router
        .oneshot(head("/vault", Some(API_KEY)))
        .await
        .expect("response");
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(events.events(), vec!["handler"]);
}

#[tokio::test]
async fn head_database_status_requires_api_key() {
    let stores = datastores(MemoryPrimary::new());
    let app = app(&stores, standard_policies(false));

    let response = app
        .router()
        .oneshot(head("/database/status", None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
