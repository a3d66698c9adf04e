//! Shared handler state

use crate::adapters::database::Database;
use crate::core::jobs::JobRegistry;
use crate::core::pipeline::PipelineCoordinator;
use crate::core::templates::TemplateService;
use std::sync::Arc;
use std::time::Duration;

/// State cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<dyn Database>,
    pub coordinator: Arc<PipelineCoordinator>,
    pub jobs: JobRegistry,
    pub templates: TemplateService,

    /// How long an upload waits for its job before answering 202
    pub request_wait: Duration,
}

impl AppState {
    pub fn new(coordinator: Arc<PipelineCoordinator>, request_wait: Duration) -> Self {
        let database = coordinator.database().clone();
        Self {
            jobs: JobRegistry::new(coordinator.clone()),
            templates: TemplateService::new(database.clone()),
            database,
            coordinator,
            request_wait,
        }
    }
}
