//! Feature modules. Each exposes a `register` function taking only the
//! repository handles it needs and returning a [`FeatureModule`].
//!
//! [`FeatureModule`]: crate::infra::http::FeatureModule

pub mod articles;
pub mod cats;
pub mod coffee_rating;
pub mod coffees;
pub mod database;
pub mod health;
