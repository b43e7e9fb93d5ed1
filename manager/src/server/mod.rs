//! Local control API server

pub mod handlers;
pub mod serve;
pub mod state;
