use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::error;

use crate::config::Config;
use crate::db::{AttendanceStore, StoreError};
use crate::error::AppError;
use crate::utils::clock::Clock;
use crate::utils::student_cache::StudentCache;

/// Everything a request handler may touch, shared through `web::Data`.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AttendanceStore>,
    pub clock: Arc<dyn Clock>,
    pub students: StudentCache,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        let students = StudentCache::new(config.student_cache_capacity);
        Self {
            config,
            store,
            clock,
            students,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Logs a storage failure and turns it into the generic 500 response.
    pub(crate) fn storage_error(&self, message: &'static str, e: StoreError) -> AppError {
        error!(error = %e, backend = self.store.backend_tag(), "{message}");
        let detail = self.config.expose_error_details().then(|| e.to_string());
        AppError::internal(message, detail)
    }
}
