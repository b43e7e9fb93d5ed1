//! HTTP clients for the external APIs

pub mod client;
pub mod sink;
pub mod source;
pub mod telemetry;
