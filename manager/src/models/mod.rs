//! Persisted and wire data models

pub mod account;
pub mod config;
pub mod deploy;
pub mod stats;
pub mod version;
