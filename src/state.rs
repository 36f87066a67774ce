use std::sync::Arc;

use crate::config::ConfigStore;
use crate::deploy::ScriptRunner;
use crate::infrastructure::logging::BoundaryLogger;

/// Everything a delivery needs. Built once before the listener starts and
/// never mutated afterwards, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    /// Empty string disables signature checks.
    pub secret: Arc<str>,
    pub runner: ScriptRunner,
    pub logger: Arc<BoundaryLogger>,
}

impl AppState {
    pub fn new(config: ConfigStore, secret: impl Into<String>, runner: ScriptRunner) -> Self {
        Self {
            config: Arc::new(config),
            secret: Arc::from(secret.into()),
            runner,
            logger: Arc::new(BoundaryLogger::new()),
        }
    }
}
