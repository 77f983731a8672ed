use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use cafe_api_types::NewArticle;

use crate::{
    application::{error::HttpError, repos::ArticlesRepo},
    domain::{articles::ArticleDraft, entities::Article, error::DomainError},
    infra::http::{Access, FeatureBuilder, FeatureModule, repo_error_to_http},
};

const SOURCE: &str = "features::articles";

pub fn register(articles: Arc<dyn ArticlesRepo>) -> FeatureModule {
    FeatureBuilder::new("articles")
        .get("/articles", Access::Public, list_articles)
        .get("/articles/{id}", Access::Public, find_article)
        .post("/articles", Access::Protected, create_article)
        .with_state(articles)
}

async fn list_articles(
    State(articles): State<Arc<dyn ArticlesRepo>>,
) -> Result<Json<Vec<Article>>, HttpError> {
    articles
        .list_published_articles()
        .await
        .map(Json)
        .map_err(|err| repo_error_to_http(SOURCE, err))
}

/// Unpublished articles are only visible to whoever holds their id.
async fn find_article(
    State(articles): State<Arc<dyn ArticlesRepo>>,
    Path(id): Path<i32>,
) -> Result<Json<Article>, HttpError> {
    let article = articles
        .find_article(id)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?
        .ok_or_else(|| DomainError::not_found("article", id))?;
    Ok(Json(article))
}

async fn create_article(
    State(articles): State<Arc<dyn ArticlesRepo>>,
    Json(input): Json<NewArticle>,
) -> Result<(StatusCode, Json<Article>), HttpError> {
    let draft = ArticleDraft::validate(input)?;
    let article = articles
        .create_article(draft)
        .await
        .map_err(|err| repo_error_to_http(SOURCE, err))?;
    Ok((StatusCode::CREATED, Json(article)))
}
