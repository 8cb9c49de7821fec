use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::computing_status::notification::{NotificationEvent, ObservationKey};
use crate::domain::computing_status::notification_classifier::is_relevant;
use crate::domain::utils::id::EventId;

static NEXT_FETCHER_REF: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered fetcher configuration. Registering a fetcher
/// again hands out a new ref, which forces a refetch on the next observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetcherRef(u64);

impl FetcherRef {
    pub fn next() -> Self {
        FetcherRef(NEXT_FETCHER_REF.fetch_add(1, Ordering::Relaxed))
    }
}

/// What one decider remembers from its previous evaluation.
#[derive(Debug, Clone, Default)]
pub struct DeciderState {
    pub last_observed_key: Option<ObservationKey>,
    pub last_fetcher_ref: Option<FetcherRef>,
    pub last_processed_event: Option<EventId>,
}

impl DeciderState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decides whether the status observed under `key` must be fetched again.
///
/// Key and fetcher changes always win. An event already processed by this
/// state is ignored; otherwise the event must be relevant to `key`.
pub fn should_refetch(
    new_event: Option<&NotificationEvent>,
    key: &ObservationKey,
    fetcher_ref: FetcherRef,
    invalidation_tags: &HashSet<String>,
    state: &DeciderState,
) -> bool {
    if state.last_observed_key.as_ref() != Some(key) {
        return true;
    }

    if state.last_fetcher_ref != Some(fetcher_ref) {
        return true;
    }

    let Some(event) = new_event else {
        return false;
    };

    if state.last_processed_event.as_ref() == Some(&event.id) {
        return false;
    }

    if event.message_type.is_none() {
        return false;
    }

    is_relevant(event, key, invalidation_tags)
}

/// Records the inputs of an evaluation, whatever its outcome.
pub fn record_observation(state: &mut DeciderState, new_event: Option<&NotificationEvent>, key: &ObservationKey, fetcher_ref: FetcherRef) {
    state.last_observed_key = Some(key.clone());
    state.last_fetcher_ref = Some(fetcher_ref);
    state.last_processed_event = new_event.map(|event| event.id.clone());
}

/// [`should_refetch`] followed by [`record_observation`].
pub fn evaluate(
    state: &mut DeciderState,
    new_event: Option<&NotificationEvent>,
    key: &ObservationKey,
    fetcher_ref: FetcherRef,
    invalidation_tags: &HashSet<String>,
) -> bool {
    let refetch = should_refetch(new_event, key, fetcher_ref, invalidation_tags, state);
    record_observation(state, new_event, key, fetcher_ref);
    refetch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::computing_status::computing_type::ComputingType;

    fn tags() -> &'static HashSet<String> {
        ComputingType::LoadFlow.invalidation_tags()
    }

    fn settled_state(key: &ObservationKey, fetcher_ref: FetcherRef) -> DeciderState {
        let mut state = DeciderState::new();
        record_observation(&mut state, None, key, fetcher_ref);
        state
    }

    #[test]
    fn test_first_observation_refetches() {
        let state = DeciderState::new();
        let key = ObservationKey::new("S", "N1");
        assert!(should_refetch(None, &key, FetcherRef::next(), tags(), &state));
    }

    #[test]
    fn test_key_change_forces_refetch() {
        let fetcher_ref = FetcherRef::next();
        let state = settled_state(&ObservationKey::new("S", "N1"), fetcher_ref);

        let other_node = ObservationKey::new("S", "N2");
        assert!(should_refetch(None, &other_node, fetcher_ref, tags(), &state));

        // Even an irrelevant event cannot veto a key change.
        let foreign = NotificationEvent::for_node("securityAnalysis_status", "N7");
        assert!(should_refetch(Some(&foreign), &other_node, fetcher_ref, tags(), &state));

        let other_study = ObservationKey::new("S2", "N1");
        assert!(should_refetch(None, &other_study, fetcher_ref, tags(), &state));
    }

    #[test]
    fn test_fetcher_change_forces_refetch() {
        let key = ObservationKey::new("S", "N1");
        let state = settled_state(&key, FetcherRef::next());
        assert!(should_refetch(None, &key, FetcherRef::next(), tags(), &state));
    }

    #[test]
    fn test_same_event_is_processed_once() {
        let key = ObservationKey::new("S", "N2");
        let fetcher_ref = FetcherRef::next();
        let mut state = settled_state(&key, fetcher_ref);
        let event = NotificationEvent::for_node("loadflow_status", "N2");

        assert!(evaluate(&mut state, Some(&event), &key, fetcher_ref, tags()));
        assert!(!evaluate(&mut state, Some(&event), &key, fetcher_ref, tags()));

        // A clone is still the same message.
        let replay = event.clone();
        assert!(!evaluate(&mut state, Some(&replay), &key, fetcher_ref, tags()));
    }

    #[test]
    fn test_equal_content_distinct_events_both_count() {
        let key = ObservationKey::new("S", "N2");
        let fetcher_ref = FetcherRef::next();
        let mut state = settled_state(&key, fetcher_ref);

        let first = NotificationEvent::for_node("loadflow_status", "N2");
        let second = NotificationEvent::for_node("loadflow_status", "N2");
        assert!(evaluate(&mut state, Some(&first), &key, fetcher_ref, tags()));
        assert!(evaluate(&mut state, Some(&second), &key, fetcher_ref, tags()));
    }

    #[test]
    fn test_no_event_or_untyped_event() {
        let key = ObservationKey::new("S", "N2");
        let fetcher_ref = FetcherRef::next();
        let state = settled_state(&key, fetcher_ref);

        assert!(!should_refetch(None, &key, fetcher_ref, tags(), &state));
        let untyped = NotificationEvent::new(None, None, None);
        assert!(!should_refetch(Some(&untyped), &key, fetcher_ref, tags(), &state));
    }

    #[test]
    fn test_event_targeted_elsewhere() {
        let key = ObservationKey::new("S", "N2");
        let fetcher_ref = FetcherRef::next();
        let state = settled_state(&key, fetcher_ref);

        let event = NotificationEvent::for_node("loadflow_status", "N3");
        assert!(!should_refetch(Some(&event), &key, fetcher_ref, tags(), &state));
    }

    #[test]
    fn test_state_is_recorded_on_negative_decision() {
        let key = ObservationKey::new("S", "N2");
        let fetcher_ref = FetcherRef::next();
        let mut state = settled_state(&key, fetcher_ref);
        let event = NotificationEvent::for_node("loadflow_status", "N3");

        assert!(!evaluate(&mut state, Some(&event), &key, fetcher_ref, tags()));
        assert_eq!(state.last_processed_event, Some(event.id.clone()));

        assert!(!evaluate(&mut state, None, &key, fetcher_ref, tags()));
        assert_eq!(state.last_processed_event, None);
    }
}
