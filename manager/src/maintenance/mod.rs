//! The maintenance core: stats collection, fuse evaluation, version
//! checking, and the deploy/rotate execution pipeline.

pub mod deploy;
pub mod fuse;
pub mod orchestrator;
pub mod rotate;
pub mod stats;
pub mod version_check;
