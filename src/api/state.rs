use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::api::ApiError;
use crate::config::AppConfig;
use crate::fetch::FeedSource;
use crate::publish::VersionControl;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub feed: Arc<dyn FeedSource>,
    pub vcs: Arc<dyn VersionControl>,
    /// Held for the duration of a build or git operation
    pub job_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, feed: Arc<dyn FeedSource>, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            config: Arc::new(config),
            feed,
            vcs,
            job_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Claim the job slot, or refuse if another job holds it.
    pub fn try_start_job(&self) -> Result<MutexGuard<'_, ()>, ApiError> {
        self.job_lock.try_lock().map_err(|_| {
            ApiError::Conflict("Another build or publish is already running".to_string())
        })
    }
}
