use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use cafe_api_types::NewCat;

use crate::{
    application::{error::HttpError, repos::CatsRepo},
    domain::{cats::CatDraft, entities::Cat, error::DomainError},
    infra::http::{Access, FeatureBuilder, FeatureModule, repo_error_to_http},
};

const SOURCE: &str = "features::cats";

pub fn register(cats: Arc<dyn CatsRepo>) -> FeatureModule {
    FeatureBuilder::new("cats")
        .get("/cats", Access::Public, list_cats)
        .get("/cats/{id}", Access::Public, find_cat)
        .post("/cats", Access::Protected, create_cat)
        .with_state(cats)
}

async fn list_cats(State(cats): State<Arc<dyn CatsRepo>>) -> Result<Json<Vec<Cat>>, HttpError> {
    cats.list_cats()
        .await
        .map(Json)
        .map_err(|err| repo_error_to_http(SOURCE, err))
}

async fn find_cat(
    State(cats): State<Arc<dyn CatsRepo>>,
    Path(id): Path<String>,
) -> Result<Json<Cat>, HttpError> {
    let cat = cats
        .find_cat(&id)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?
        .ok_or_else(|| DomainError::not_found("cat", &id))?;
    Ok(Json(cat))
}

async fn create_cat(
    State(cats): State<Arc<dyn CatsRepo>>,
    Json(input): Json<NewCat>,
) -> Result<(StatusCode, Json<Cat>), HttpError> {
    let draft = CatDraft::validate(input)?;
    let cat = cats
        .create_cat(draft)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(cat)))
}
