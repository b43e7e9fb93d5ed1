//! Server state

use std::sync::Arc;

use crate::maintenance::orchestrator::Orchestrator;
use crate::ops::Operations;

/// Server state shared across handlers
pub struct ServerState {
    pub ops: Operations,
    pub orchestrator: Arc<Orchestrator>,
}

impl ServerState {
    pub fn new(ops: Operations, orchestrator: Arc<Orchestrator>) -> Self {
        Self { ops, orchestrator }
    }
}
