use axum::extract::FromRef;
use std::time::Instant;

use crate::jobs::JobQueryEngine;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub engine: JobQueryEngine,
}

impl ServerState {
    pub fn new(config: ServerConfig, engine: JobQueryEngine) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            engine,
        }
    }
}

impl FromRef<ServerState> for JobQueryEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.engine.clone()
    }
}
