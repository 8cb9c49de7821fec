use std::fmt;

use crate::api::study_update_dto::StudyUpdateDto;
use crate::domain::utils::id::{EventId, NodeId, StudyId};
use crate::error::Result;

/// What a status is observed for: one node of one study.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservationKey {
    pub study_id: StudyId,
    pub node_id: NodeId,
}

impl ObservationKey {
    pub fn new(study_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self { study_id: StudyId::new(study_id), node_id: NodeId::new(node_id) }
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.study_id, self.node_id)
    }
}

/// One push message from the backend.
///
/// The `id` is assigned once on reception and survives clones, so two
/// values with the same `id` are the same message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub id: EventId,
    pub message_type: Option<String>,
    pub target_node: Option<NodeId>,
    pub target_nodes: Option<Vec<NodeId>>,
}

impl NotificationEvent {
    pub fn new(message_type: Option<String>, target_node: Option<NodeId>, target_nodes: Option<Vec<NodeId>>) -> Self {
        Self { id: EventId::generate(), message_type, target_node, target_nodes }
    }

    /// Event addressed to every node of the study.
    pub fn broadcast(message_type: impl Into<String>) -> Self {
        Self::new(Some(message_type.into()), None, None)
    }

    pub fn for_node(message_type: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::new(Some(message_type.into()), Some(NodeId::new(node_id)), None)
    }

    pub fn for_nodes<I, S>(message_type: impl Into<String>, node_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Some(message_type.into()), None, Some(node_ids.into_iter().map(NodeId::new).collect()))
    }

    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    pub fn is_broadcast(&self) -> bool {
        self.target_node.is_none() && self.target_nodes.is_none()
    }
}

impl From<StudyUpdateDto> for NotificationEvent {
    fn from(dto: StudyUpdateDto) -> Self {
        let headers = dto.headers;
        NotificationEvent::new(
            headers.update_type,
            headers.node.map(NodeId::new),
            headers.nodes.map(|nodes| nodes.into_iter().map(NodeId::new).collect()),
        )
    }
}

impl NotificationEvent {
    /// Parses one study update message; each call yields a new event identity.
    pub fn from_json(json: &str) -> Result<Self> {
        let dto: StudyUpdateDto = serde_json::from_str(json)?;
        Ok(dto.into())
    }
}
