//! Relational connectors: the Postgres primary store and the engine-selectable
//! secondary store.

mod articles;
mod coffees;
pub mod secondary;
mod util;

pub use secondary::{SecondaryConnector, SecondaryStore, SqlEngine};
pub use util::map_sqlx_error;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPool, PgPoolOptions},
    query,
};
use tracing::{info, warn};

use crate::{
    application::repos::{HealthCheck, RepoError},
    config::{DatabaseSettings, RuntimeMode, Settings},
};

use super::{
    connector::{Connector, ConnectorKind},
    error::InfraError,
};

/// Connects the primary relational store and, when enabled, brings its schema
/// up to date with the embedded migrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

#[async_trait]
impl Connector for PostgresConnector {
    type Handle = PostgresStore;

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Primary
    }

    async fn connect(&self, settings: &Settings) -> Result<PostgresStore, InfraError> {
        let database = &settings.database;
        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections.get())
            .connect_with(PostgresStore::connect_options(database))
            .await?;

        if database.synchronize {
            if settings.mode == RuntimeMode::Production {
                warn!(
                    target = "cafe::db::primary",
                    "schema synchronisation is enabled in production mode"
                );
            }
            PostgresStore::synchronize(&pool).await?;
        }

        info!(
            target = "cafe::db::primary",
            host = %database.host,
            port = database.port,
            database = %database.database,
            synchronize = database.synchronize,
            "primary database connected"
        );

        Ok(PostgresStore::new(pool))
    }
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connect_options(database: &DatabaseSettings) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&database.host)
            .port(database.port)
            .username(&database.username)
            .password(&database.password)
            .database(&database.database)
    }

    pub async fn synchronize(pool: &PgPool) -> Result<(), InfraError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PostgresStore {
    fn name(&self) -> &'static str {
        ConnectorKind::Primary.as_str()
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}
