//! Infrastructure adapters: datastore connectors, HTTP plumbing and telemetry.

pub mod connector;
pub mod db;
pub mod document;
pub mod error;
pub mod http;
pub mod telemetry;
