#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, Response},
};
use cafe::{
    application::repos::{
        ArticlesRepo, CatsRepo, CoffeesRepo, EngineProbe, HealthCheck, PageWindow, RepoError,
    },
    bootstrap::{Connectors, Datastores, DocumentHandle, PrimaryHandle, SecondaryHandle},
    config::{self, CliArgs, ConfigSource, Settings},
    domain::{
        articles::ArticleDraft,
        cats::CatDraft,
        coffees::{CoffeeChanges, CoffeeDraft},
        entities::{Article, Cat, Coffee},
    },
    infra::{
        connector::{Connector, ConnectorKind},
        error::InfraError,
    },
};
use clap::Parser;
use serde_json::Value;
use time::OffsetDateTime;

pub const API_KEY: &str = "brew-key";

pub fn base_vars() -> Vec<(String, String)> {
    [
        ("DATABASE_HOST", "db.internal"),
        ("DATABASE_USERNAME", "cafe"),
        ("DATABASE_PASSWORD", "s3cret"),
        ("DATABASE_DATABASE", "cafe"),
        ("API_KEY", API_KEY),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

pub fn config_source(dir: &std::path::Path, vars: Vec<(String, String)>) -> ConfigSource {
    let dir = dir.to_str().expect("utf-8 temp dir");
    ConfigSource::new(CliArgs::parse_from(["cafe", "--env-dir", dir]), vars)
}

pub fn settings() -> Settings {
    let dir = tempfile::tempdir().expect("temp dir");
    config::load(&config_source(dir.path(), base_vars())).expect("valid settings")
}

/// Shared ordered log of what ran during a request or a startup.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().expect("event log").push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().expect("event log").clone()
    }
}

#[derive(Default)]
pub struct MemoryPrimary {
    coffees: Mutex<Vec<Coffee>>,
    articles: Mutex<Vec<Article>>,
    events: Option<EventLog>,
    healthy: bool,
}

impl MemoryPrimary {
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    pub fn with_coffee(self, name: &str, brand: &str) -> Self {
        {
            let mut coffees = self.coffees.lock().expect("coffees");
            let id = coffees.len() as i32 + 1;
            coffees.push(Coffee {
                id,
                name: name.to_string(),
                brand: brand.to_string(),
                flavors: Vec::new(),
                recommendations: 0,
            });
        }
        self
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    fn record(&self, event: &str) {
        if let Some(events) = self.events.as_ref() {
            events.push(event);
        }
    }
}

#[async_trait]
impl CoffeesRepo for MemoryPrimary {
    async fn list_coffees(&self, window: PageWindow) -> Result<Vec<Coffee>, RepoError> {
        self.record("handler");
        let coffees = self.coffees.lock().expect("coffees");
        Ok(coffees
            .iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .cloned()
            .collect())
    }

    async fn find_coffee(&self, id: i32) -> Result<Option<Coffee>, RepoError> {
        self.record("handler");
        let coffees = self.coffees.lock().expect("coffees");
        Ok(coffees.iter().find(|coffee| coffee.id == id).cloned())
    }

    async fn create_coffee(&self, draft: CoffeeDraft) -> Result<Coffee, RepoError> {
        self.record("handler");
        let mut coffees = self.coffees.lock().expect("coffees");
        let coffee = Coffee {
            id: coffees.len() as i32 + 1,
            name: draft.name,
            brand: draft.brand,
            flavors: draft.flavors,
            recommendations: 0,
        };
        coffees.push(coffee.clone());
        Ok(coffee)
    }

    async fn update_coffee(
        &self,
        id: i32,
        changes: CoffeeChanges,
    ) -> Result<Option<Coffee>, RepoError> {
        let mut coffees = self.coffees.lock().expect("coffees");
        let Some(coffee) = coffees.iter_mut().find(|coffee| coffee.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            coffee.name = name;
        }
        if let Some(brand) = changes.brand {
            coffee.brand = brand;
        }
        if let Some(flavors) = changes.flavors {
            coffee.flavors = flavors;
        }
        Ok(Some(coffee.clone()))
    }

    async fn remove_coffee(&self, id: i32) -> Result<bool, RepoError> {
        let mut coffees = self.coffees.lock().expect("coffees");
        let before = coffees.len();
        coffees.retain(|coffee| coffee.id != id);
        Ok(coffees.len() != before)
    }

    async fn recommend_coffee(&self, id: i32) -> Result<Option<Coffee>, RepoError> {
        let mut coffees = self.coffees.lock().expect("coffees");
        Ok(coffees.iter_mut().find(|coffee| coffee.id == id).map(|coffee| {
            coffee.recommendations += 1;
            coffee.clone()
        }))
    }
}

#[async_trait]
impl ArticlesRepo for MemoryPrimary {
    async fn list_published_articles(&self) -> Result<Vec<Article>, RepoError> {
        let articles = self.articles.lock().expect("articles");
        Ok(articles
            .iter()
            .filter(|article| article.published)
            .cloned()
            .collect())
    }

    async fn find_article(&self, id: i32) -> Result<Option<Article>, RepoError> {
        let articles = self.articles.lock().expect("articles");
        Ok(articles.iter().find(|article| article.id == id).cloned())
    }

    async fn create_article(&self, draft: ArticleDraft) -> Result<Article, RepoError> {
        let mut articles = self.articles.lock().expect("articles");
        if articles.iter().any(|article| article.title == draft.title) {
            return Err(RepoError::Duplicate {
                constraint: "articles_title_key".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let article = Article {
            id: articles.len() as i32 + 1,
            title: draft.title,
            description: draft.description,
            body: draft.body,
            published: draft.published,
            created_at: now,
            updated_at: now,
        };
        articles.push(article.clone());
        Ok(article)
    }
}

#[async_trait]
impl HealthCheck for MemoryPrimary {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepoError::Unavailable("primary offline".to_string()))
        }
    }
}

pub struct MemorySecondary {
    pub reachable: bool,
}

#[async_trait]
impl EngineProbe for MemorySecondary {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    async fn ping(&self) -> Result<(), RepoError> {
        if self.reachable {
            Ok(())
        } else {
            Err(RepoError::Timeout)
        }
    }
}

#[async_trait]
impl HealthCheck for MemorySecondary {
    fn name(&self) -> &'static str {
        "secondary"
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await
    }
}

#[derive(Default)]
pub struct MemoryDocument {
    cats: Mutex<Vec<Cat>>,
    panic_on_list: bool,
}

impl MemoryDocument {
    pub fn panicking() -> Self {
        Self {
            panic_on_list: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CatsRepo for MemoryDocument {
    async fn list_cats(&self) -> Result<Vec<Cat>, RepoError> {
        if self.panic_on_list {
            panic!("cats collection corrupted");
        }
        Ok(self.cats.lock().expect("cats").clone())
    }

    async fn find_cat(&self, id: &str) -> Result<Option<Cat>, RepoError> {
        let cats = self.cats.lock().expect("cats");
        Ok(cats.iter().find(|cat| cat.id == id).cloned())
    }

    async fn create_cat(&self, draft: CatDraft) -> Result<Cat, RepoError> {
        let mut cats = self.cats.lock().expect("cats");
        let cat = Cat {
            id: format!("cat-{}", cats.len() + 1),
            name: draft.name,
            age: draft.age,
            breed: draft.breed,
        };
        cats.push(cat.clone());
        Ok(cat)
    }
}

#[async_trait]
impl HealthCheck for MemoryDocument {
    fn name(&self) -> &'static str {
        "document"
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

pub fn datastores(primary: MemoryPrimary) -> Datastores {
    Datastores {
        primary: PrimaryHandle::new(primary),
        secondary: SecondaryHandle::new(MemorySecondary { reachable: true }),
        document: DocumentHandle::new(MemoryDocument::default()),
    }
}

/// Connector double: counts calls, optionally waits or fails.
pub struct FakeConnector<H> {
    kind: ConnectorKind,
    make: fn() -> H,
    delay: Duration,
    fail: bool,
    calls: Arc<AtomicUsize>,
    events: EventLog,
}

impl<H> FakeConnector<H> {
    pub fn new(kind: ConnectorKind, make: fn() -> H, events: EventLog) -> Self {
        Self {
            kind,
            make,
            delay: Duration::ZERO,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            events,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<H: Send + Sync + 'static> Connector for FakeConnector<H> {
    type Handle = H;

    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    async fn connect(&self, _settings: &Settings) -> Result<H, InfraError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(InfraError::database("connection refused"));
        }
        self.events.push(format!("connected:{}", self.kind));
        Ok((self.make)())
    }
}

pub type FakeConnectors =
    Connectors<FakeConnector<MemoryPrimary>, FakeConnector<MemorySecondary>, FakeConnector<MemoryDocument>>;

pub fn fake_connectors(events: &EventLog) -> FakeConnectors {
    Connectors {
        primary: FakeConnector::new(ConnectorKind::Primary, MemoryPrimary::new, events.clone()),
        secondary: FakeConnector::new(
            ConnectorKind::Secondary,
            || MemorySecondary { reachable: true },
            events.clone(),
        ),
        document: FakeConnector::new(
            ConnectorKind::Document,
            MemoryDocument::default,
            events.clone(),
        ),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: &str, uri: &str, body: Value, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("authorization", format!("Bearer {key}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}
