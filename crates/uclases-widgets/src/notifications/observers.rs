use uclases_core::dom::{Document, HIDDEN_CLASS, NodeId};
use uclases_core::{Result, UnreadCountChanged};

const MARK_ALL_ENABLED_CLASS: &str = "px-4 py-2 rounded-lg font-medium text-sm transition-colors flex items-center gap-2 bg-blue-600 hover:bg-blue-700 text-white";
const MARK_ALL_DISABLED_CLASS: &str = "px-4 py-2 rounded-lg font-medium text-sm transition-colors flex items-center gap-2 bg-gray-300 dark:bg-gray-700 text-gray-500 dark:text-gray-400 cursor-not-allowed";
const COUNT_PILL_CLASS: &str = "ml-1 px-2 py-0.5 bg-white/20 rounded-full text-xs font-bold";

pub const MARK_ALL_LABEL: &str = "Marcar todas como leídas";
pub const ALL_READ_LABEL: &str = "Todas leídas";
pub const ALL_READ_TITLE: &str = "Todas las notificaciones están leídas";

/// A display element that follows the unread notification count.
pub trait UnreadCountObserver: Send {
    fn on_unread_count_changed(&self, doc: &mut Document, event: UnreadCountChanged) -> Result<()>;
}

/// Navbar badge: shows the count, hidden when nothing is unread.
pub struct BadgeObserver {
    badge: NodeId,
}

impl BadgeObserver {
    pub fn new(badge: NodeId) -> Self {
        Self { badge }
    }
}

impl UnreadCountObserver for BadgeObserver {
    fn on_unread_count_changed(&self, doc: &mut Document, event: UnreadCountChanged) -> Result<()> {
        if event.count > 0 {
            doc.set_text(self.badge, event.count.to_string())?;
            doc.remove_class(self.badge, HIDDEN_CLASS)
        } else {
            doc.add_class(self.badge, HIDDEN_CLASS)
        }
    }
}

/// "Mark all as read" button: enabled with a count pill while anything is
/// unread, disabled otherwise.
pub struct MarkAllButtonObserver {
    button: NodeId,
}

impl MarkAllButtonObserver {
    pub fn new(button: NodeId) -> Self {
        Self { button }
    }
}

impl UnreadCountObserver for MarkAllButtonObserver {
    fn on_unread_count_changed(&self, doc: &mut Document, event: UnreadCountChanged) -> Result<()> {
        let button = self.button;
        if event.count > 0 {
            doc.set_disabled(button, false)?;
            doc.set_class_name(button, MARK_ALL_ENABLED_CLASS)?;
            doc.remove_attr(button, "title")?;
            doc.set_text(button, MARK_ALL_LABEL)?;
            let pill = doc
                .build("span")
                .class(COUNT_PILL_CLASS)
                .text(event.count.to_string())
                .id();
            doc.replace_children(button, vec![pill])
        } else {
            doc.set_disabled(button, true)?;
            doc.set_class_name(button, MARK_ALL_DISABLED_CLASS)?;
            doc.set_attr(button, "title", ALL_READ_TITLE)?;
            doc.set_text(button, ALL_READ_LABEL)?;
            doc.remove_children(button)
        }
    }
}
