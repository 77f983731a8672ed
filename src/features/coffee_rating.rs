use axum::{
    Json,
    extract::{Path, State},
};
use cafe_api_types::RateCoffee;

use crate::{
    application::{coffee_rating::CoffeeRatingService, error::HttpError},
    domain::entities::RatingOutcome,
    infra::http::{Access, FeatureBuilder, FeatureModule},
};

pub fn register(service: CoffeeRatingService) -> FeatureModule {
    FeatureBuilder::new("coffee-rating")
        .post("/coffee-ratings/{coffee_id}", Access::Protected, rate_coffee)
        .with_state(service)
}

async fn rate_coffee(
    State(service): State<CoffeeRatingService>,
    Path(coffee_id): Path<i32>,
    Json(input): Json<RateCoffee>,
) -> Result<Json<RatingOutcome>, HttpError> {
    Ok(Json(service.rate(coffee_id, input.score).await?))
}
