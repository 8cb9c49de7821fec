use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::computing_status::computing_type::ComputingType;
use crate::domain::computing_status::notification::ObservationKey;
use crate::domain::computing_status::running_status::RunningStatus;
use crate::domain::utils::id::EventId;

/// Subscription to cache writes. Called after the cache lock is released,
/// from whichever task performed the write.
///
/// When a fetch result is applied, `on_status_change` and
/// `on_computation_completed` run with the fetch coordinator locked. A
/// listener must not call back into the coordinator (`observe`, `register`,
/// `forget`, `switch_key`, `current_key`); doing so deadlocks.
pub trait StatusListener: fmt::Debug + Send + Sync {
    fn on_status_change(&self, computing_type: ComputingType, status: RunningStatus);

    fn on_computation_completed(&self, _computing_type: ComputingType) {}
}

/// Listener that only writes status changes to the log.
#[derive(Debug, Default)]
pub struct LoggingStatusListener;

impl StatusListener for LoggingStatusListener {
    fn on_status_change(&self, computing_type: ComputingType, status: RunningStatus) {
        log::info!("Status of {} is now {}.", computing_type, status);
    }

    fn on_computation_completed(&self, computing_type: ComputingType) {
        log::info!("Computation {} completed.", computing_type);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStatusEntry {
    pub status: RunningStatus,
    /// Event that triggered the fetch whose result is stored, if any.
    pub last_applied_event: Option<EventId>,
    pub last_observed_key: Option<ObservationKey>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<ComputingType, CachedStatusEntry>,
    last_completed: Option<ComputingType>,
}

/// Current status per computing type plus the last computation seen finishing.
///
/// Cheap to clone; all clones share the same state. Only the fetch
/// coordinator writes, everything else reads.
#[derive(Debug, Clone, Default)]
pub struct StatusCache {
    inner: Arc<RwLock<CacheInner>>,
    listeners: Arc<RwLock<Vec<Arc<dyn StatusListener>>>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn StatusListener>) {
        self.listeners.write().unwrap_or_else(PoisonError::into_inner).push(listener);
    }

    pub fn get(&self, computing_type: ComputingType) -> Option<RunningStatus> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.entries.get(&computing_type).map(|entry| entry.status)
    }

    pub fn entry(&self, computing_type: ComputingType) -> Option<CachedStatusEntry> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.entries.get(&computing_type).cloned()
    }

    pub fn snapshot(&self) -> HashMap<ComputingType, RunningStatus> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.entries.iter().map(|(computing_type, entry)| (*computing_type, entry.status)).collect()
    }

    pub fn set(&self, computing_type: ComputingType, status: RunningStatus) {
        {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            guard
                .entries
                .entry(computing_type)
                .and_modify(|entry| entry.status = status)
                .or_insert(CachedStatusEntry { status, last_applied_event: None, last_observed_key: None });
        }
        self.notify_status(computing_type, status);
    }

    /// Writes a fetch result together with the event and key it was fetched for.
    pub fn apply(&self, computing_type: ComputingType, status: RunningStatus, event: Option<EventId>, key: ObservationKey) {
        {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            guard
                .entries
                .insert(computing_type, CachedStatusEntry { status, last_applied_event: event, last_observed_key: Some(key) });
        }
        self.notify_status(computing_type, status);
    }

    pub fn get_last_completed(&self) -> Option<ComputingType> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).last_completed
    }

    pub fn set_last_completed(&self, computing_type: Option<ComputingType>) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).last_completed = computing_type;

        if let Some(completed) = computing_type {
            for listener in self.listeners_snapshot() {
                listener.on_computation_completed(completed);
            }
        }
    }

    fn notify_status(&self, computing_type: ComputingType, status: RunningStatus) {
        for listener in self.listeners_snapshot() {
            listener.on_status_change(computing_type, status);
        }
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn StatusListener>> {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
