use std::collections::HashSet;

use crate::domain::computing_status::notification::{NotificationEvent, ObservationKey};

/// Whether `event` should invalidate the status observed under `key`.
///
/// The message type must be one of `invalidation_tags`. Events without any
/// node target concern every node; targeted events only concern the nodes
/// they name.
pub fn is_relevant(event: &NotificationEvent, key: &ObservationKey, invalidation_tags: &HashSet<String>) -> bool {
    let Some(message_type) = event.message_type() else {
        return false;
    };
    if !invalidation_tags.contains(message_type) {
        return false;
    }

    if event.is_broadcast() {
        return true;
    }

    let targets_node = event.target_node.as_ref() == Some(&key.node_id);
    let in_target_nodes = event.target_nodes.as_ref().is_some_and(|nodes| nodes.contains(&key.node_id));

    targets_node || in_target_nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::computing_status::computing_type::ComputingType;

    fn key(node: &str) -> ObservationKey {
        ObservationKey::new("study-1", node)
    }

    fn load_flow_tags() -> &'static HashSet<String> {
        ComputingType::LoadFlow.invalidation_tags()
    }

    #[test]
    fn test_broadcast_is_relevant_to_every_node() {
        let event = NotificationEvent::broadcast("loadflow_status");
        assert!(is_relevant(&event, &key("N1"), load_flow_tags()));
        assert!(is_relevant(&event, &key("N2"), load_flow_tags()));
        assert!(is_relevant(&event, &ObservationKey::new("other-study", "N9"), load_flow_tags()));
    }

    #[test]
    fn test_targeted_node() {
        let event = NotificationEvent::for_node("loadflow_status", "A");
        assert!(is_relevant(&event, &key("A"), load_flow_tags()));
        assert!(!is_relevant(&event, &key("B"), load_flow_tags()));
    }

    #[test]
    fn test_targeted_node_list() {
        let event = NotificationEvent::for_nodes("loadflow_failed", ["N1", "N3"]);
        assert!(is_relevant(&event, &key("N1"), load_flow_tags()));
        assert!(is_relevant(&event, &key("N3"), load_flow_tags()));
        assert!(!is_relevant(&event, &key("N2"), load_flow_tags()));
    }

    #[test]
    fn test_either_target_field_matches() {
        let event = NotificationEvent::new(
            Some("loadflow_status".to_string()),
            Some("N1".into()),
            Some(vec!["N2".into()]),
        );
        assert!(is_relevant(&event, &key("N1"), load_flow_tags()));
        assert!(is_relevant(&event, &key("N2"), load_flow_tags()));
        assert!(!is_relevant(&event, &key("N3"), load_flow_tags()));
    }

    #[test]
    fn test_empty_target_list_is_not_a_broadcast() {
        let event = NotificationEvent::new(Some("loadflow_status".to_string()), None, Some(vec![]));
        assert!(!is_relevant(&event, &key("N1"), load_flow_tags()));
    }

    #[test]
    fn test_foreign_or_missing_message_type() {
        let completion_only = NotificationEvent::broadcast("loadflowResult");
        assert!(!is_relevant(&completion_only, &key("N1"), load_flow_tags()));

        let other_kind = NotificationEvent::broadcast("securityAnalysis_status");
        assert!(!is_relevant(&other_kind, &key("N1"), load_flow_tags()));

        let untyped = NotificationEvent::new(None, None, None);
        assert!(!is_relevant(&untyped, &key("N1"), load_flow_tags()));
    }
}
