//! HTTP collaborators of the page widgets: the match
//! lookup endpoint and the notification read-state endpoints.

pub mod error;
pub mod http;
pub mod matches;
pub mod notifications;

pub use error::{LookupError, Result};
pub use http::AjaxClient;
pub use matches::{HttpMatchSource, MatchSource, fetch_matches, parse_matches};
pub use notifications::{HttpNotificationBackend, NotificationBackend};
