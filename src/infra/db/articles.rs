use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ArticlesRepo, RepoError},
    domain::{articles::ArticleDraft, entities::Article},
};

use super::{PostgresStore, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i32,
    title: String,
    description: Option<String>,
    body: String,
    published: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            body: row.body,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ArticlesRepo for PostgresStore {
    async fn list_published_articles(&self) -> Result<Vec<Article>, RepoError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, description, body, published, created_at, updated_at
            FROM articles
            WHERE published
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn find_article(&self, id: i32) -> Result<Option<Article>, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, description, body, published, created_at, updated_at
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Article::from))
    }

    async fn create_article(&self, draft: ArticleDraft) -> Result<Article, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            INSERT INTO articles (title, description, body, published)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, body, published, created_at, updated_at
            "#,
        )
        .bind(draft.title)
        .bind(draft.description)
        .bind(draft.body)
        .bind(draft.published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
