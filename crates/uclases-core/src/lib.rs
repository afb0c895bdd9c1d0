pub mod config;
pub mod dom;
pub mod error;
pub mod models;

pub use config::{AppConfig, AutocompleteDefaults, MarkAllPolicy};
pub use dom::{Document, NodeId};
pub use error::{Result, WidgetError};
pub use models::*;
