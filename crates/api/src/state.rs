use std::sync::Arc;

use mathviz_core::JobStore;
use mathviz_pipeline::Orchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// In-memory job registry (read side for status/list handlers).
    pub store: Arc<JobStore>,
    /// The pipeline engine jobs are handed to on submission.
    pub orchestrator: Arc<Orchestrator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
