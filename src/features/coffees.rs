use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use cafe_api_types::{CoffeePatch, NewCoffee, Pagination};
use tracing::info;

use crate::{
    application::{
        error::HttpError,
        repos::{CoffeesRepo, PageWindow},
    },
    domain::{
        coffees::{CoffeeChanges, CoffeeDraft},
        entities::Coffee,
        error::DomainError,
    },
    infra::http::{Access, FeatureBuilder, FeatureModule, repo_error_to_http},
};

const SOURCE: &str = "features::coffees";

pub fn register(coffees: Arc<dyn CoffeesRepo>) -> FeatureModule {
    FeatureBuilder::new("coffees")
        .get("/coffees", Access::Public, list_coffees)
        .get("/coffees/{id}", Access::Public, find_coffee)
        .post("/coffees", Access::Protected, create_coffee)
        .patch("/coffees/{id}", Access::Protected, update_coffee)
        .delete("/coffees/{id}", Access::Protected, remove_coffee)
        .with_state(coffees)
}

async fn list_coffees(
    State(coffees): State<Arc<dyn CoffeesRepo>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Coffee>>, HttpError> {
    coffees
        .list_coffees(PageWindow::from(pagination))
        .await
        .map(Json)
        .map_err(|err| repo_error_to_http(SOURCE, err))
}

async fn find_coffee(
    State(coffees): State<Arc<dyn CoffeesRepo>>,
    Path(id): Path<i32>,
) -> Result<Json<Coffee>, HttpError> {
    let coffee = coffees
        .find_coffee(id)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?
        .ok_or_else(|| DomainError::not_found("coffee", id))?;
    Ok(Json(coffee))
}

async fn create_coffee(
    State(coffees): State<Arc<dyn CoffeesRepo>>,
    Json(input): Json<NewCoffee>,
) -> Result<(StatusCode, Json<Coffee>), HttpError> {
    let draft = CoffeeDraft::validate(input)?;
    let coffee = coffees
        .create_coffee(draft)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?;

    info!(target = "cafe::coffees", coffee_id = coffee.id, "coffee created");
    Ok((StatusCode::CREATED, Json(coffee)))
}

async fn update_coffee(
    State(coffees): State<Arc<dyn CoffeesRepo>>,
    Path(id): Path<i32>,
    Json(input): Json<CoffeePatch>,
) -> Result<Json<Coffee>, HttpError> {
    let changes = CoffeeChanges::validate(input)?;
    if changes.is_empty() {
        return Err(DomainError::validation("patch must change at least one field").into());
    }

    let coffee = coffees
        .update_coffee(id, changes)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?
        .ok_or_else(|| DomainError::not_found("coffee", id))?;
    Ok(Json(coffee))
}

async fn remove_coffee(
    State(coffees): State<Arc<dyn CoffeesRepo>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, HttpError> {
    let removed = coffees
        .remove_coffee(id)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?;
    if !removed {
        return Err(DomainError::not_found("coffee", id).into());
    }

    info!(target = "cafe::coffees", coffee_id = id, "coffee removed");
    Ok(StatusCode::NO_CONTENT)
}
