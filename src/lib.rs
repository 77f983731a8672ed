pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod features;
pub mod infra;
