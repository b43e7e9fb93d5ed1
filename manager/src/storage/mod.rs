//! Persistence: key-value store, typed repository, settings, paths

pub mod kv;
pub mod layout;
pub mod repo;
pub mod settings;
