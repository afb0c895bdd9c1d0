use serde::{Deserialize, Serialize};

/// Reply of the per-notification mark-read / mark-unread endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleReadResponse {
    pub success: bool,
    pub is_read: bool,
    pub new_url: Option<String>,
    pub unread_count: u32,
    pub error: Option<String>,
}

/// Reply of the mark-all-as-read endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkAllReadResponse {
    pub success: bool,
    pub error: Option<String>,
}

/// Emitted whenever the number of unread notifications is known to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadCountChanged {
    pub count: u32,
}
