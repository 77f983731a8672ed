use std::sync::Arc;

use axum::{extract::State, response::Response};
use futures::future::join_all;

use crate::{
    application::repos::HealthCheck,
    infra::http::{Access, FeatureBuilder, FeatureModule, health_response},
};

pub fn register(checks: Vec<Arc<dyn HealthCheck>>) -> FeatureModule {
    FeatureBuilder::new("health")
        .get("/_health", Access::Public, health)
        .with_state(Arc::new(checks))
}

async fn health(State(checks): State<Arc<Vec<Arc<dyn HealthCheck>>>>) -> Response {
    let results = join_all(checks.iter().map(|check| async move {
        (check.name(), check.health_check().await)
    }))
    .await;
    health_response(results)
}
