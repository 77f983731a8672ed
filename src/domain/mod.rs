//! Domain layer types and invariants.

pub mod articles;
pub mod cats;
pub mod coffees;
pub mod entities;
pub mod error;
