pub mod match_item;
pub mod notification;

pub use match_item::{MatchId, MatchItem};
pub use notification::{MarkAllReadResponse, ToggleReadResponse, UnreadCountChanged};
