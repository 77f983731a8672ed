//! Records handed out by the repositories. They double as the API wire types.

pub use cafe_api_types::{Article, Cat, Coffee, DatabaseStatus, RatingOutcome};
