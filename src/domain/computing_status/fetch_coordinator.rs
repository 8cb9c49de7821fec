use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::domain::computing_status::computing_type::ComputingType;
use crate::domain::computing_status::notification::{NotificationEvent, ObservationKey};
use crate::domain::computing_status::running_status::{RawStatus, RunningStatus, StatusConverter};
use crate::domain::computing_status::status_cache::StatusCache;
use crate::domain::computing_status::status_fetcher::StatusFetcher;
use crate::domain::computing_status::update_decider::{DeciderState, FetcherRef, evaluate};
use crate::domain::utils::id::EventId;
use crate::error::FetchError;

/// `tracing` target of per-epoch outcome events.
pub const SYNC_TARGET: &str = "status_sync";

/// Fetcher and converter registered for one computing type.
#[derive(Debug, Clone)]
pub struct StatusSource {
    pub fetcher: Arc<dyn StatusFetcher>,
    pub converter: StatusConverter,
    pub fetcher_ref: FetcherRef,
}

#[derive(Debug, Default)]
struct TypeState {
    source: Option<StatusSource>,
    decider: DeciderState,
    /// Cancellation flag of the newest epoch.
    in_flight: Option<Arc<AtomicBool>>,
    epochs: u64,
}

#[derive(Debug, Default)]
struct CoordinatorInner {
    types: HashMap<ComputingType, TypeState>,
    /// Key of the most recently opened epoch, whatever its type.
    current_key: Option<ObservationKey>,
}

/// Everything a spawned fetch needs to decide whether and how to apply its result.
#[derive(Debug)]
struct FetchEpoch {
    computing_type: ComputingType,
    number: u64,
    expected_key: ObservationKey,
    event_id: Option<EventId>,
    event_type: Option<String>,
    cancelled: Arc<AtomicBool>,
    converter: StatusConverter,
}

impl FetchEpoch {
    /// A terminal status only counts as a completion when a completion
    /// notification opened the epoch.
    fn is_completion(&self, status: RunningStatus) -> bool {
        status.is_terminal() && self.event_type.as_ref().is_some_and(|event_type| self.computing_type.completion_tags().contains(event_type))
    }
}

/// Keeps the [`StatusCache`] in sync with the study server.
///
/// Each `observe` call asks the update decider of the computing type whether
/// a refetch is needed. If so, a new fetch epoch supersedes the previous one
/// of that type; only the newest epoch, and only while the observed key is
/// unchanged, may write its result.
///
/// Clones share state. `observe` must run inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    cache: StatusCache,
    inner: Arc<Mutex<CoordinatorInner>>,
}

impl FetchCoordinator {
    pub fn new(cache: StatusCache) -> Self {
        Self { cache, inner: Arc::new(Mutex::new(CoordinatorInner::default())) }
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    pub fn current_key(&self) -> Option<ObservationKey> {
        self.lock().current_key.clone()
    }

    /// Registers (or replaces) the fetcher of a computing type.
    pub fn register(&self, computing_type: ComputingType, fetcher: Arc<dyn StatusFetcher>, converter: StatusConverter) -> FetcherRef {
        let fetcher_ref = FetcherRef::next();
        let mut inner = self.lock();
        inner.types.entry(computing_type).or_default().source = Some(StatusSource { fetcher, converter, fetcher_ref });
        log::debug!("Registered status fetcher {:?} for {}.", fetcher_ref, computing_type);
        fetcher_ref
    }

    /// Moves the observation to `key`. On an actual change the last completed
    /// computation is forgotten, whether or not any fetch follows, and
    /// results still in flight for the previous key are discarded on arrival.
    pub fn switch_key(&self, key: &ObservationKey) -> bool {
        let mut inner = self.lock();
        if inner.current_key.as_ref() == Some(key) {
            return false;
        }
        inner.current_key = Some(key.clone());
        self.cache.set_last_completed(None);
        log::info!("Observed node switched to {}, forgetting last completed computation.", key);
        true
    }

    /// Drops what the decider of `computing_type` remembers and cancels its
    /// in-flight fetch, so the next observation fetches again.
    pub fn forget(&self, computing_type: ComputingType) {
        let mut inner = self.lock();
        if let Some(state) = inner.types.get_mut(&computing_type) {
            state.decider = DeciderState::new();
            if let Some(flag) = state.in_flight.take() {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Re-evaluates the status of `computing_type` for `key`, optionally in
    /// reaction to `event`. Returns the handle of the spawned fetch when one
    /// was started.
    pub fn observe(&self, key: &ObservationKey, computing_type: ComputingType, event: Option<&NotificationEvent>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::error!("Cannot observe {} for {}: no tokio runtime.", computing_type, key);
            return None;
        };

        let (epoch, fetcher) = {
            let mut inner = self.lock();
            let key_changed = inner.current_key.as_ref() != Some(key);

            let state = inner.types.entry(computing_type).or_default();
            let Some(source) = state.source.clone() else {
                log::warn!("No status fetcher registered for {}, ignoring observation.", computing_type);
                return None;
            };

            if !evaluate(&mut state.decider, event, key, source.fetcher_ref, computing_type.invalidation_tags()) {
                log::debug!("No refetch of {} for {} (event {:?}).", computing_type, key, event.map(|e| &e.id));
                return None;
            }

            let cancelled = Arc::new(AtomicBool::new(false));
            if let Some(previous) = state.in_flight.replace(cancelled.clone()) {
                previous.store(true, Ordering::SeqCst);
            }
            state.epochs += 1;

            let epoch = FetchEpoch {
                computing_type,
                number: state.epochs,
                expected_key: key.clone(),
                event_id: event.map(|e| e.id.clone()),
                event_type: event.and_then(|e| e.message_type.clone()),
                cancelled,
                converter: source.converter,
            };

            if key_changed {
                log::info!("Observed node switched to {}, forgetting last completed computation.", key);
            }
            inner.current_key = Some(key.clone());
            // Cleared at epoch open, under the same lock as the epoch writes.
            self.cache.set_last_completed(None);
            (epoch, source.fetcher)
        };

        log::debug!("Opening fetch epoch {} of {} for {}.", epoch.number, computing_type, key);
        let fetch = fetcher.fetch_status(key);
        let coordinator = self.clone();
        Some(runtime.spawn(async move { coordinator.run_epoch(epoch, fetch).await }))
    }

    async fn run_epoch(self, epoch: FetchEpoch, fetch: BoxFuture<'static, Result<RawStatus, FetchError>>) {
        let outcome = fetch.await;

        // Staleness check and write happen under the coordinator lock so no
        // newer epoch can open in between.
        let inner = self.lock();
        if epoch.cancelled.load(Ordering::SeqCst) || inner.current_key.as_ref() != Some(&epoch.expected_key) {
            tracing::debug!(
                target: SYNC_TARGET,
                ComputingType = %epoch.computing_type,
                Epoch = epoch.number,
                NodeId = %epoch.expected_key.node_id,
                "Discarding stale status result"
            );
            return;
        }

        match outcome {
            Ok(raw) => {
                let status = (epoch.converter)(raw.as_deref());
                self.cache.apply(epoch.computing_type, status, epoch.event_id.clone(), epoch.expected_key.clone());

                let completed = epoch.is_completion(status);
                if completed {
                    self.cache.set_last_completed(Some(epoch.computing_type));
                }

                tracing::info!(
                    target: SYNC_TARGET,
                    ComputingType = %epoch.computing_type,
                    Epoch = epoch.number,
                    NodeId = %epoch.expected_key.node_id,
                    RawStatus = ?raw,
                    Status = %status,
                    Completed = completed,
                    "Status applied"
                );
            }
            Err(e) => {
                log::warn!("Fetching {} status for {} failed: {}", epoch.computing_type, epoch.expected_key, e);
                self.cache.apply(epoch.computing_type, RunningStatus::Failed, epoch.event_id.clone(), epoch.expected_key.clone());
            }
        }
        drop(inner);
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
