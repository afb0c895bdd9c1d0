use serde::Serialize;

use super::NodeId;

/// Kind of event a widget dispatched on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The bound value of a form control changed.
    Change,
    /// A form was submitted programmatically.
    Submit,
}

/// A record in the document's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
}
