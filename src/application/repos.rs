//! Repository traits describing persistence adapters.
//!
//! Each datastore handle implements the traits for the feature modules it
//! backs; feature modules only ever see `Arc<dyn Trait>`.

use async_trait::async_trait;
use cafe_api_types::Pagination;
use thiserror::Error;

use crate::domain::{
    articles::ArticleDraft,
    cats::CatDraft,
    coffees::{CoffeeChanges, CoffeeDraft},
    entities::{Article, Cat, Coffee},
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

const DEFAULT_PAGE_LIMIT: u32 = 20;
const MAX_PAGE_LIMIT: u32 = 100;

/// Offset pagination with the limit clamped to `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u32,
}

impl From<Pagination> for PageWindow {
    fn from(value: Pagination) -> Self {
        Self {
            limit: value
                .limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
            offset: value.offset.unwrap_or(0),
        }
    }
}

#[async_trait]
pub trait CatsRepo: Send + Sync {
    async fn list_cats(&self) -> Result<Vec<Cat>, RepoError>;
    async fn find_cat(&self, id: &str) -> Result<Option<Cat>, RepoError>;
    async fn create_cat(&self, draft: CatDraft) -> Result<Cat, RepoError>;
}

#[async_trait]
pub trait CoffeesRepo: Send + Sync {
    async fn list_coffees(&self, window: PageWindow) -> Result<Vec<Coffee>, RepoError>;
    async fn find_coffee(&self, id: i32) -> Result<Option<Coffee>, RepoError>;
    async fn create_coffee(&self, draft: CoffeeDraft) -> Result<Coffee, RepoError>;
    async fn update_coffee(
        &self,
        id: i32,
        changes: CoffeeChanges,
    ) -> Result<Option<Coffee>, RepoError>;
    /// Returns `false` when no coffee with `id` existed.
    async fn remove_coffee(&self, id: i32) -> Result<bool, RepoError>;
    async fn recommend_coffee(&self, id: i32) -> Result<Option<Coffee>, RepoError>;
}

#[async_trait]
pub trait ArticlesRepo: Send + Sync {
    async fn list_published_articles(&self) -> Result<Vec<Article>, RepoError>;
    async fn find_article(&self, id: i32) -> Result<Option<Article>, RepoError>;
    async fn create_article(&self, draft: ArticleDraft) -> Result<Article, RepoError>;
}

/// Reachability probe for the secondary relational store.
#[async_trait]
pub trait EngineProbe: Send + Sync {
    fn engine(&self) -> &'static str;
    async fn ping(&self) -> Result<(), RepoError>;
}

/// Liveness check every datastore handle answers.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &'static str;
    async fn health_check(&self) -> Result<(), RepoError>;
}
