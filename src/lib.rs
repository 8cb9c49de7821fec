use crate::domain::computing_status::status_cache::StatusCache;
use crate::domain::computing_status::status_synchronizer::StatusSynchronizer;
use crate::domain::computing_status::sync_config::SyncConfig;
use crate::error::Result;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Builds a synchronizer from a JSON configuration file, writing into `cache`.
pub fn build_synchronizer(config_path: &str, cache: StatusCache) -> Result<StatusSynchronizer> {
    let config = SyncConfig::load(config_path)?;
    log::info!("Configuration loaded, study server at {}.", config.study_server_url);

    StatusSynchronizer::from_config(&config, cache)
}
