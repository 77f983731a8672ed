use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    application::repos::{CoffeesRepo, RepoError},
    domain::{coffees::RatingScore, entities::RatingOutcome, error::DomainError},
};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Rates coffees through the coffees repository; it owns no storage of its own.
#[derive(Clone)]
pub struct CoffeeRatingService {
    coffees: Arc<dyn CoffeesRepo>,
}

impl CoffeeRatingService {
    pub fn new(coffees: Arc<dyn CoffeesRepo>) -> Self {
        Self { coffees }
    }

    pub async fn rate(&self, coffee_id: i32, score: u8) -> Result<RatingOutcome, RatingError> {
        let score = RatingScore::new(score)?;

        let coffee = if score.recommends() {
            self.coffees.recommend_coffee(coffee_id).await?
        } else {
            self.coffees.find_coffee(coffee_id).await?
        };
        let coffee = coffee.ok_or_else(|| DomainError::not_found("coffee", coffee_id))?;

        debug!(
            target = "cafe::coffee_rating",
            coffee_id,
            score = score.get(),
            recommended = score.recommends(),
            "coffee rated"
        );

        Ok(RatingOutcome {
            coffee_id: coffee.id,
            score: score.get(),
            recommended: score.recommends(),
            recommendations: coffee.recommendations,
        })
    }
}
