//! Wire types shared by the cafe service and its clients.
//!
//! Successful responses are wrapped in [`DataEnvelope`]; guard rejections use
//! [`Rejection`]; translated handler failures use [`ErrorEnvelope`].

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Standard envelope produced by the response-wrapping interceptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body sent when the authorization guard denies a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub status_code: u16,
    pub message: String,
    pub error: String,
}

/// Body produced by the error-translation filter when it is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: String,
    pub timestamp: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub id: String,
    pub name: String,
    pub age: i32,
    pub breed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCat {
    pub name: String,
    pub age: i32,
    pub breed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coffee {
    pub id: i32,
    pub name: String,
    pub brand: String,
    pub flavors: Vec<String>,
    pub recommendations: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoffee {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub flavors: Vec<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoffeePatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub flavors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateCoffee {
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingOutcome {
    pub coffee_id: i32,
    pub score: u8,
    pub recommended: bool,
    pub recommendations: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStatus {
    pub engine: String,
    pub reachable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_uses_camel_case_status() {
        let body = Rejection {
            status_code: 403,
            message: "Forbidden resource".to_string(),
            error: "Forbidden".to_string(),
        };
        let value = serde_json::to_value(&body).expect("serialize rejection");
        assert_eq!(value["statusCode"], 403);
        assert!(value.get("status_code").is_none());
    }

    #[test]
    fn coffee_patch_defaults_every_field() {
        let patch: CoffeePatch = serde_json::from_str("{}").expect("empty patch");
        assert!(patch.name.is_none());
        assert!(patch.brand.is_none());
        assert!(patch.flavors.is_none());
    }
}
