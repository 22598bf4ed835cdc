use std::sync::Arc;

use mentora_jobs::service::ReportService;
use mentora_store::memory::MemoryAnalytics;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService<MemoryAnalytics>>,
}
