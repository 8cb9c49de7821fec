use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::domain::computing_status::computing_type::ComputingType;
use crate::domain::computing_status::fetch_coordinator::FetchCoordinator;
use crate::domain::computing_status::notification::{NotificationEvent, ObservationKey};
use crate::domain::computing_status::running_status::{StatusConverter, default_converter};
use crate::domain::computing_status::status_cache::StatusCache;
use crate::domain::computing_status::status_fetcher::{HttpStatusFetcher, StatusFetcher};
use crate::domain::computing_status::sync_config::{ServiceAvailability, SyncConfig};
use crate::error::Result;

/// Session-level entry point: keeps the status of every registered computing
/// type in sync for the node currently displayed.
#[derive(Debug)]
pub struct StatusSynchronizer {
    coordinator: FetchCoordinator,
    availability: BTreeMap<ComputingType, ServiceAvailability>,
    current_key: Option<ObservationKey>,
}

impl StatusSynchronizer {
    pub fn new(cache: StatusCache) -> Self {
        Self { coordinator: FetchCoordinator::new(cache), availability: BTreeMap::new(), current_key: None }
    }

    /// Registers an HTTP fetcher with the default converter for every
    /// configured computing type.
    pub fn from_config(config: &SyncConfig, cache: StatusCache) -> Result<Self> {
        let client = HttpStatusFetcher::build_client(config.request_timeout)?;
        let mut synchronizer = Self::new(cache);

        for (computing_type, availability) in &config.computations {
            let fetcher = HttpStatusFetcher::new(client.clone(), config.study_server_url.clone(), *computing_type);
            synchronizer.register(*computing_type, Arc::new(fetcher), default_converter(*computing_type), *availability);
        }

        log::info!("Status synchronizer configured for {} computing types.", config.computations.len());
        Ok(synchronizer)
    }

    pub fn cache(&self) -> &StatusCache {
        self.coordinator.cache()
    }

    pub fn coordinator(&self) -> &FetchCoordinator {
        &self.coordinator
    }

    pub fn current_key(&self) -> Option<&ObservationKey> {
        self.current_key.as_ref()
    }

    pub fn availability(&self, computing_type: ComputingType) -> Option<ServiceAvailability> {
        self.availability.get(&computing_type).copied()
    }

    /// Registers or replaces a computing type. Replacing the fetcher of an
    /// observed type makes its next observation refetch.
    pub fn register(
        &mut self,
        computing_type: ComputingType,
        fetcher: Arc<dyn StatusFetcher>,
        converter: StatusConverter,
        availability: ServiceAvailability,
    ) {
        self.coordinator.register(computing_type, fetcher, converter);
        self.availability.insert(computing_type, availability);
    }

    /// Changes the availability of a registered service. A service that
    /// comes back up is observed again right away.
    pub fn set_availability(&mut self, computing_type: ComputingType, availability: ServiceAvailability) -> Option<JoinHandle<()>> {
        let Some(previous) = self.availability.get_mut(&computing_type) else {
            log::warn!("Availability change for unregistered computing type {} ignored.", computing_type);
            return None;
        };
        if *previous == availability {
            return None;
        }
        *previous = availability;
        log::info!("Service for {} is now {:?}.", computing_type, availability);

        if availability != ServiceAvailability::Up {
            self.coordinator.forget(computing_type);
            return None;
        }

        let key = self.current_key.as_ref()?;
        self.coordinator.observe(key, computing_type, None)
    }

    /// Starts observing another node; every available type is refreshed. The
    /// last completed computation is reset even when no type is available.
    pub fn switch_node(&mut self, key: ObservationKey) -> Vec<JoinHandle<()>> {
        self.coordinator.switch_key(&key);
        self.current_key = Some(key);
        self.observe_all(None)
    }

    /// Feeds one notification to every available type.
    pub fn on_notification(&self, event: &NotificationEvent) -> Vec<JoinHandle<()>> {
        if self.current_key.is_none() {
            log::debug!("Notification {:?} received before any node was selected, ignoring.", event.id);
            return Vec::new();
        }
        self.observe_all(Some(event))
    }

    /// Parses a raw study update message and feeds it to every available type.
    pub fn on_study_update(&self, json: &str) -> Result<Vec<JoinHandle<()>>> {
        let event = NotificationEvent::from_json(json)?;
        Ok(self.on_notification(&event))
    }

    fn observe_all(&self, event: Option<&NotificationEvent>) -> Vec<JoinHandle<()>> {
        let Some(key) = self.current_key.as_ref() else {
            return Vec::new();
        };

        self.availability
            .iter()
            .filter(|(_, availability)| **availability == ServiceAvailability::Up)
            .filter_map(|(computing_type, _)| self.coordinator.observe(key, *computing_type, event))
            .collect()
    }
}
