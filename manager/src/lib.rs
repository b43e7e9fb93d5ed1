//! Fleetkeeper Library
//!
//! Core modules for the worker-fleet maintenance manager.

pub mod app;
pub mod errors;
pub mod http;
pub mod logs;
pub mod maintenance;
pub mod models;
pub mod ops;
pub mod registry;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workers;
