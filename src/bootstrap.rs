//! Composition root.
//!
//! Startup runs in a fixed order, once per process:
//! configuration → datastore connectors (joined) → feature modules → global
//! policies. Any failure in the first two steps aborts startup; the caller
//! only ever sees a fully assembled [`Application`] or a [`BootstrapError`].

use std::{fmt, sync::Arc};

use axum::Router;
use thiserror::Error;
use tracing::info;

use crate::{
    application::{
        coffee_rating::CoffeeRatingService,
        repos::{ArticlesRepo, CatsRepo, CoffeesRepo, EngineProbe, HealthCheck},
    },
    config::{self, ConfigSource, LoadError, Settings},
    features,
    infra::{
        connector::{Connector, ConnectorKind},
        db::{PostgresConnector, SecondaryConnector},
        document::MongoConnector,
        error::InfraError,
        http::{self, FeatureModule, PolicyRegistry, PolicySummary, RouteConflict, RouteTable},
    },
};

/// Engine the secondary relational connector is registered with.
pub const SECONDARY_ENGINE: &str = "mysql";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("startup hook failed: {0}")]
    Setup(#[source] InfraError),
    #[error("{kind} datastore connector failed: {source}")]
    Connector {
        kind: ConnectorKind,
        #[source]
        source: InfraError,
    },
    #[error("duplicate route: {0}")]
    DuplicateRoute(#[from] RouteConflict),
}

/// The three connectors the composition root drives.
#[derive(Debug, Clone)]
pub struct Connectors<P, S, D> {
    pub primary: P,
    pub secondary: S,
    pub document: D,
}

impl Connectors<PostgresConnector, SecondaryConnector, MongoConnector> {
    pub fn standard() -> Result<Self, InfraError> {
        Ok(Self {
            primary: PostgresConnector,
            secondary: SecondaryConnector::register(SECONDARY_ENGINE)?,
            document: MongoConnector,
        })
    }
}

/// Repository views of the primary relational handle.
#[derive(Clone)]
pub struct PrimaryHandle {
    pub coffees: Arc<dyn CoffeesRepo>,
    pub articles: Arc<dyn ArticlesRepo>,
    pub health: Arc<dyn HealthCheck>,
}

impl PrimaryHandle {
    pub fn new<H>(handle: H) -> Self
    where
        H: CoffeesRepo + ArticlesRepo + HealthCheck + 'static,
    {
        let handle = Arc::new(handle);
        Self {
            coffees: handle.clone(),
            articles: handle.clone(),
            health: handle,
        }
    }
}

#[derive(Clone)]
pub struct SecondaryHandle {
    pub probe: Arc<dyn EngineProbe>,
    pub health: Arc<dyn HealthCheck>,
}

impl SecondaryHandle {
    pub fn new<H>(handle: H) -> Self
    where
        H: EngineProbe + HealthCheck + 'static,
    {
        let handle = Arc::new(handle);
        Self {
            probe: handle.clone(),
            health: handle,
        }
    }
}

#[derive(Clone)]
pub struct DocumentHandle {
    pub cats: Arc<dyn CatsRepo>,
    pub health: Arc<dyn HealthCheck>,
}

impl DocumentHandle {
    pub fn new<H>(handle: H) -> Self
    where
        H: CatsRepo + HealthCheck + 'static,
    {
        let handle = Arc::new(handle);
        Self {
            cats: handle.clone(),
            health: handle,
        }
    }
}

/// Live datastore handles. Owned here; feature modules get `Arc` clones.
#[derive(Clone)]
pub struct Datastores {
    pub primary: PrimaryHandle,
    pub secondary: SecondaryHandle,
    pub document: DocumentHandle,
}

impl Datastores {
    pub fn health_checks(&self) -> Vec<Arc<dyn HealthCheck>> {
        vec![
            self.primary.health.clone(),
            self.secondary.health.clone(),
            self.document.health.clone(),
        ]
    }
}

async fn connect_one<C: Connector>(
    connector: &C,
    settings: &Settings,
) -> Result<C::Handle, BootstrapError> {
    let kind = connector.kind();
    info!(target = "cafe::bootstrap", connector = %kind, "connecting datastore");
    connector
        .connect(settings)
        .await
        .map_err(|source| BootstrapError::Connector { kind, source })
}

/// Connect all three datastores concurrently; the first failure wins and the
/// remaining connection attempts are dropped.
pub async fn connect_datastores<P, S, D>(
    settings: &Settings,
    connectors: &Connectors<P, S, D>,
) -> Result<Datastores, BootstrapError>
where
    P: Connector,
    P::Handle: CoffeesRepo + ArticlesRepo + HealthCheck,
    S: Connector,
    S::Handle: EngineProbe + HealthCheck,
    D: Connector,
    D::Handle: CatsRepo + HealthCheck,
{
    let (primary, secondary, document) = tokio::try_join!(
        connect_one(&connectors.primary, settings),
        connect_one(&connectors.secondary, settings),
        connect_one(&connectors.document, settings),
    )?;

    Ok(Datastores {
        primary: PrimaryHandle::new(primary),
        secondary: SecondaryHandle::new(secondary),
        document: DocumentHandle::new(document),
    })
}

/// Call each feature's registration function with the handles it needs.
pub fn register_features(datastores: &Datastores) -> Vec<FeatureModule> {
    vec![
        features::cats::register(datastores.document.cats.clone()),
        features::coffees::register(datastores.primary.coffees.clone()),
        features::coffee_rating::register(CoffeeRatingService::new(
            datastores.primary.coffees.clone(),
        )),
        features::articles::register(datastores.primary.articles.clone()),
        features::database::register(datastores.secondary.probe.clone()),
        features::health::register(datastores.health_checks()),
    ]
}

/// An assembled service, ready to be bound to a listener.
pub struct Application {
    settings: Arc<Settings>,
    router: Router,
    routes: RouteTable,
    policies: PolicySummary,
}

impl Application {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn policies(&self) -> PolicySummary {
        self.policies
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.routes.len())
            .field("policies", &self.policies)
            .finish()
    }
}

/// Feature registration and policy wiring over already-connected datastores.
pub fn compose(
    settings: Settings,
    datastores: &Datastores,
    policies: PolicyRegistry,
) -> Result<Application, BootstrapError> {
    let features = register_features(datastores);
    let summary = policies.summary();
    let (router, routes) = http::build_router(features, policies)?;

    info!(
        target = "cafe::bootstrap",
        routes = routes.len(),
        policies = %summary,
        "features registered"
    );

    Ok(Application {
        settings: Arc::new(settings),
        router,
        routes,
        policies: summary,
    })
}

/// Connect, register features and install the configured policies.
pub async fn assemble<P, S, D>(
    settings: Settings,
    connectors: &Connectors<P, S, D>,
) -> Result<Application, BootstrapError>
where
    P: Connector,
    P::Handle: CoffeesRepo + ArticlesRepo + HealthCheck,
    S: Connector,
    S::Handle: EngineProbe + HealthCheck,
    D: Connector,
    D::Handle: CatsRepo + HealthCheck,
{
    let datastores = connect_datastores(&settings, connectors).await?;
    info!(target = "cafe::bootstrap", "datastores connected");

    let policies = PolicyRegistry::from_settings(&settings.policies);
    compose(settings, &datastores, policies)
}

/// Full startup: load configuration, run `on_configured` (telemetry is
/// installed there), then [`assemble`]. No connector is touched when
/// configuration fails.
pub async fn start<P, S, D, F>(
    source: &ConfigSource,
    connectors: &Connectors<P, S, D>,
    on_configured: F,
) -> Result<Application, BootstrapError>
where
    P: Connector,
    P::Handle: CoffeesRepo + ArticlesRepo + HealthCheck,
    S: Connector,
    S::Handle: EngineProbe + HealthCheck,
    D: Connector,
    D::Handle: CatsRepo + HealthCheck,
    F: FnOnce(&Settings) -> Result<(), InfraError>,
{
    let settings = config::load(source)?;
    on_configured(&settings).map_err(BootstrapError::Setup)?;
    info!(
        target = "cafe::bootstrap",
        mode = %settings.mode,
        "configuration loaded"
    );

    assemble(settings, connectors).await
}
