//! Application state.

use std::sync::Arc;

use tubedl_jobs::JobRegistry;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub registry: Arc<JobRegistry>,
}

impl AppState {
    /// Create new application state, ensuring the jobs directory exists.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.jobs_dir).await?;
        let registry = Arc::new(JobRegistry::new(&config.jobs_dir));

        Ok(Self { config, registry })
    }
}
