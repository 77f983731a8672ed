//! Secondary relational store. The engine is picked by name when the
//! connector is registered and must agree with the configured URL.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use sqlx::{
    AnyPool,
    any::{AnyPoolOptions, install_default_drivers},
};
use tracing::info;

use crate::{
    application::repos::{EngineProbe, HealthCheck, RepoError},
    config::Settings,
    infra::{
        connector::{Connector, ConnectorKind},
        error::InfraError,
    },
};

use super::map_sqlx_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlEngine {
    MySql,
    Postgres,
}

impl SqlEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    fn schemes(self) -> &'static [&'static str] {
        match self {
            Self::MySql => &["mysql", "mariadb"],
            Self::Postgres => &["postgres", "postgresql"],
        }
    }

    /// Whether `url` names a scheme this engine speaks.
    pub fn accepts_url(self, url: &str) -> bool {
        url.split_once("://")
            .map(|(scheme, _)| self.schemes().contains(&scheme.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl FromStr for SqlEngine {
    type Err = InfraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(InfraError::configuration(format!(
                "unsupported secondary database engine `{other}`"
            ))),
        }
    }
}

impl fmt::Display for SqlEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SecondaryConnector {
    engine: SqlEngine,
}

impl SecondaryConnector {
    /// Select the engine for the secondary store, e.g. `register("mysql")`.
    pub fn register(engine: &str) -> Result<Self, InfraError> {
        Ok(Self {
            engine: engine.parse()?,
        })
    }

    pub fn engine(&self) -> SqlEngine {
        self.engine
    }
}

#[async_trait]
impl Connector for SecondaryConnector {
    type Handle = SecondaryStore;

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Secondary
    }

    async fn connect(&self, settings: &Settings) -> Result<SecondaryStore, InfraError> {
        let secondary = &settings.secondary;
        if !self.engine.accepts_url(&secondary.url) {
            return Err(InfraError::configuration(format!(
                "secondary.url does not use the registered `{}` engine",
                self.engine
            )));
        }

        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(secondary.max_connections.get())
            .connect(&secondary.url)
            .await?;

        info!(
            target = "cafe::db::secondary",
            engine = %self.engine,
            "secondary database connected"
        );

        Ok(SecondaryStore {
            engine: self.engine,
            pool,
        })
    }
}

#[derive(Clone)]
pub struct SecondaryStore {
    engine: SqlEngine,
    pool: AnyPool,
}

impl SecondaryStore {
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl EngineProbe for SecondaryStore {
    fn engine(&self) -> &'static str {
        self.engine.as_str()
    }

    async fn ping(&self) -> Result<(), RepoError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl HealthCheck for SecondaryStore {
    fn name(&self) -> &'static str {
        ConnectorKind::Secondary.as_str()
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await
    }
}
