use async_trait::async_trait;

use crate::{
    application::repos::{CoffeesRepo, PageWindow, RepoError},
    domain::{
        coffees::{CoffeeChanges, CoffeeDraft},
        entities::Coffee,
    },
};

use super::{PostgresStore, map_sqlx_error};

const COFFEE_COLUMNS: &str = "id, name, brand, flavors, recommendations";

#[derive(sqlx::FromRow)]
struct CoffeeRow {
    id: i32,
    name: String,
    brand: String,
    flavors: Vec<String>,
    recommendations: i32,
}

impl From<CoffeeRow> for Coffee {
    fn from(row: CoffeeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            brand: row.brand,
            flavors: row.flavors,
            recommendations: row.recommendations,
        }
    }
}

#[async_trait]
impl CoffeesRepo for PostgresStore {
    async fn list_coffees(&self, window: PageWindow) -> Result<Vec<Coffee>, RepoError> {
        let rows = sqlx::query_as::<_, CoffeeRow>(&format!(
            "SELECT {COFFEE_COLUMNS} FROM coffees ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(window.limit))
        .bind(i64::from(window.offset))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Coffee::from).collect())
    }

    async fn find_coffee(&self, id: i32) -> Result<Option<Coffee>, RepoError> {
        let row = sqlx::query_as::<_, CoffeeRow>(&format!(
            "SELECT {COFFEE_COLUMNS} FROM coffees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Coffee::from))
    }

    async fn create_coffee(&self, draft: CoffeeDraft) -> Result<Coffee, RepoError> {
        let row = sqlx::query_as::<_, CoffeeRow>(&format!(
            "INSERT INTO coffees (name, brand, flavors) VALUES ($1, $2, $3) \
             RETURNING {COFFEE_COLUMNS}"
        ))
        .bind(draft.name)
        .bind(draft.brand)
        .bind(draft.flavors)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_coffee(
        &self,
        id: i32,
        changes: CoffeeChanges,
    ) -> Result<Option<Coffee>, RepoError> {
        let row = sqlx::query_as::<_, CoffeeRow>(&format!(
            "UPDATE coffees SET \
                name = COALESCE($2, name), \
                brand = COALESCE($3, brand), \
                flavors = COALESCE($4, flavors) \
             WHERE id = $1 \
             RETURNING {COFFEE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.brand)
        .bind(changes.flavors)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Coffee::from))
    }

    async fn remove_coffee(&self, id: i32) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM coffees WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn recommend_coffee(&self, id: i32) -> Result<Option<Coffee>, RepoError> {
        let row = sqlx::query_as::<_, CoffeeRow>(&format!(
            "UPDATE coffees SET recommendations = recommendations + 1 \
             WHERE id = $1 \
             RETURNING {COFFEE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Coffee::from))
    }
}
