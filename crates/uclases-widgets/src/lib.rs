//! The autocomplete controller and the notification
//! read-state toggles, driven by a [`Page`].

pub mod autocomplete;
pub mod debounce;
pub mod notifications;
pub mod page;

pub use autocomplete::{Autocomplete, BindingMode, ClickOutcome, WidgetId, WidgetState};
pub use notifications::NotificationToggler;
pub use page::{Key, Page, UiEvent};
