use std::sync::Arc;

use tokio::sync::Mutex;

use crate::capabilities::Capabilities;
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::{seconds, ScheduleRunner, ScheduleTickJob, Scheduler};
use crate::store::ContentStore;

/// Everything a handler or the background job needs, built once per process.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<ContentStore>,
    pub capabilities: Arc<Capabilities>,
    pub runner: Arc<ScheduleRunner>,
    scheduler: Arc<Mutex<Scheduler>>,
}

impl AppContext {
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(ContentStore::new(config.db_path()).await?);
        let capabilities = Arc::new(Capabilities::resolve(&config));
        Ok(Self::from_parts(config, store, capabilities))
    }

    pub fn from_parts(
        config: Config,
        store: Arc<ContentStore>,
        capabilities: Arc<Capabilities>,
    ) -> Self {
        let runner = Arc::new(ScheduleRunner::new(
            Arc::clone(&store),
            Arc::clone(&capabilities),
        ));
        for issue in &capabilities.issues {
            tracing::warn!(issue = %issue, "Capability unavailable");
        }
        let mut scheduler = Scheduler::new();
        scheduler.register_job(Arc::new(ScheduleTickJob::new(
            Arc::clone(&runner),
            seconds(config.scheduler.poll_seconds),
        )));
        Self {
            config: Arc::new(config),
            store,
            capabilities,
            runner,
            scheduler: Arc::new(Mutex::new(scheduler)),
        }
    }

    /// Starts the schedule poller unless disabled in config.
    pub async fn start(&self) {
        if !self.config.scheduler.enabled {
            tracing::info!("Background scheduler disabled");
            return;
        }
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_running() {
            return;
        }
        scheduler.start();
        tracing::info!(
            poll_seconds = self.config.scheduler.poll_seconds,
            "Background scheduler started"
        );
    }

    pub async fn stop(&self) {
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_running() {
            scheduler.stop().await;
            tracing::info!("Background scheduler stopped");
        }
    }

    pub async fn scheduler_running(&self) -> bool {
        self.scheduler.lock().await.is_running()
    }
}
