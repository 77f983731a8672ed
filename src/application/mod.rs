//! Application services and the repository seams feature modules depend on.

pub mod coffee_rating;
pub mod error;
pub mod repos;
