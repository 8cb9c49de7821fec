pub mod computing_type;
pub mod fetch_coordinator;
pub mod notification;
pub mod notification_classifier;
pub mod running_status;
pub mod status_cache;
pub mod status_fetcher;
pub mod status_fetcher_mock;
pub mod status_synchronizer;
pub mod sync_config;
pub mod update_decider;
