//! Demo surface over the secondary relational store.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::warn;

use crate::{
    application::repos::EngineProbe,
    domain::entities::DatabaseStatus,
    infra::http::{Access, FeatureBuilder, FeatureModule},
};

pub fn register(probe: Arc<dyn EngineProbe>) -> FeatureModule {
    FeatureBuilder::new("database")
        .get("/database/status", Access::Protected, database_status)
        .with_state(probe)
}

async fn database_status(State(probe): State<Arc<dyn EngineProbe>>) -> Json<DatabaseStatus> {
    let reachable = match probe.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(
                target = "cafe::database",
                engine = probe.engine(),
                error = %err,
                "secondary database ping failed"
            );
            false
        }
    };

    Json(DatabaseStatus {
        engine: probe.engine().to_string(),
        reachable,
    })
}
