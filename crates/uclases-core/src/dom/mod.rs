//! Arena-backed element tree standing in for the server-rendered page.
//!
//! Widgets never own markup: they look elements up by marker attribute,
//! read their configuration from `data-*` attributes and patch classes,
//! values and children in place.

mod document;
mod event;

pub use document::{Document, Element, ElementBuilder, NodeId};
pub use event::{DispatchedEvent, EventKind};

/// Class used everywhere to hide an element.
pub const HIDDEN_CLASS: &str = "hidden";
