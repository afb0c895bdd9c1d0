//! Read/unread toggles for notification cards, patched in place from the
//! endpoint's JSON reply instead of reloading the page.
//!
//! Count displays never query the page themselves: they are registered as
//! [`UnreadCountObserver`]s when present and receive every
//! [`UnreadCountChanged`].

mod observers;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uclases_core::dom::{Document, NodeId};
use uclases_core::{MarkAllPolicy, MarkAllReadResponse, Result, ToggleReadResponse, UnreadCountChanged};
use uclases_lookup::NotificationBackend;

pub use observers::{
    ALL_READ_LABEL, ALL_READ_TITLE, BadgeObserver, MARK_ALL_LABEL, MarkAllButtonObserver,
    UnreadCountObserver,
};

use crate::page::Completion;

pub const MARK_FORM_CLASS: &str = "mark-notification-form";
pub const CARD_CLASS: &str = "notification-card";
pub const BADGE_CLASS: &str = "notification-badge";
pub const MARK_ALL_FORM_ID: &str = "mark-all-read-form";

const MARK_READ_SEGMENT: &str = "/mark-read/";
const MARK_UNREAD_SEGMENT: &str = "/mark-unread/";

/// Classes that flag a card as unread.
pub const UNREAD_CARD_CLASSES: [&str; 4] = [
    "border-l-4",
    "border-l-blue-500",
    "bg-blue-50/50",
    "dark:bg-blue-900/10",
];

const READ_BUTTON_CLASS: &str = "group px-2 py-1 text-xs font-medium bg-gray-200 dark:bg-gray-700 text-gray-600 dark:text-gray-300 rounded hover:bg-red-100 dark:hover:bg-red-900/30 hover:text-red-600 dark:hover:text-red-400 transition-colors";
const UNREAD_BUTTON_CLASS: &str = "px-2 py-1 text-xs font-bold bg-blue-500 text-white rounded hover:bg-blue-600 transition-colors flex items-center gap-1";

pub const READ_LABEL: &str = "Leída";
pub const UNREAD_LABEL: &str = "Marcar como leída";
pub const BUSY_LABEL: &str = "Marcando...";
pub const TOGGLE_FAILED: &str = "Error al actualizar la notificación";
pub const MARK_ALL_FAILED: &str = "Error al marcar todas como leídas";

#[derive(Debug, Clone, Copy)]
struct MarkAllForm {
    form: NodeId,
    button: NodeId,
}

/// Mark-all button content saved while the request is in flight.
#[derive(Debug, Clone)]
struct SavedLabel {
    text: String,
    children: Vec<NodeId>,
}

pub struct NotificationToggler {
    backend: Arc<dyn NotificationBackend>,
    policy: MarkAllPolicy,
    observers: Vec<Box<dyn UnreadCountObserver>>,
    updates: broadcast::Sender<UnreadCountChanged>,
    mark_all: Option<MarkAllForm>,
    saved_label: Option<SavedLabel>,
    alerts: Vec<String>,
    reload_requested: bool,
}

impl NotificationToggler {
    /// Register observers for the count displays present in `doc`.
    pub fn attach(
        doc: &Document,
        backend: Arc<dyn NotificationBackend>,
        policy: MarkAllPolicy,
    ) -> Self {
        let mut observers: Vec<Box<dyn UnreadCountObserver>> = Vec::new();
        if let Some(badge) = doc.query_class(doc.root(), BADGE_CLASS) {
            observers.push(Box::new(BadgeObserver::new(badge)));
        }

        let mark_all = doc.get_by_id(MARK_ALL_FORM_ID).and_then(|form| {
            doc.query_tag(form, "button")
                .map(|button| MarkAllForm { form, button })
        });
        if let Some(mark_all) = mark_all {
            observers.push(Box::new(MarkAllButtonObserver::new(mark_all.button)));
        }

        let (updates, _) = broadcast::channel(16);
        Self {
            backend,
            policy,
            observers,
            updates,
            mark_all,
            saved_label: None,
            alerts: Vec::new(),
            reload_requested: false,
        }
    }

    /// Receive every unread count change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<UnreadCountChanged> {
        self.updates.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested
    }

    /// Intercept a submitted form. Returns `false` for forms this toggler
    /// does not own, which then submit normally.
    pub fn on_submit(
        &mut self,
        doc: &mut Document,
        form: NodeId,
        tasks: &mut JoinSet<Completion>,
    ) -> Result<bool> {
        if doc.has_class(form, MARK_FORM_CLASS) {
            self.submit_toggle(doc, form, tasks)?;
            return Ok(true);
        }
        match self.mark_all {
            Some(mark_all) if mark_all.form == form => {
                self.submit_mark_all(doc, mark_all, tasks)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn submit_toggle(
        &mut self,
        doc: &mut Document,
        form: NodeId,
        tasks: &mut JoinSet<Completion>,
    ) -> Result<()> {
        let button = doc.query_tag(form, "button");
        if let Some(button) = button {
            if doc.is_disabled(button) {
                debug!(%form, "toggle already in flight");
                return Ok(());
            }
            doc.set_disabled(button, true)?;
        }

        let action = doc.attr(form, "action").unwrap_or_default().to_string();
        let fields = doc.form_fields(form);
        let backend = Arc::clone(&self.backend);
        tasks.spawn(async move {
            let result = backend.toggle_read(&action, &fields).await;
            Completion::ToggleRead { form, result }
        });
        Ok(())
    }

    pub fn on_toggle_finished(
        &mut self,
        doc: &mut Document,
        form: NodeId,
        result: uclases_lookup::Result<ToggleReadResponse>,
    ) -> Result<()> {
        let button = doc.query_tag(form, "button");
        let applied = match result {
            Ok(resp) if resp.success => self.apply_toggle(doc, form, button, &resp),
            Ok(resp) => {
                self.alerts
                    .push(resp.error.unwrap_or_else(|| TOGGLE_FAILED.to_string()));
                Ok(())
            }
            Err(e) => {
                warn!(%form, error = %e, "notification toggle failed");
                self.alerts.push(TOGGLE_FAILED.to_string());
                Ok(())
            }
        };

        if let Some(button) = button {
            doc.set_disabled(button, false)?;
        }
        applied
    }

    fn apply_toggle(
        &mut self,
        doc: &mut Document,
        form: NodeId,
        button: Option<NodeId>,
        resp: &ToggleReadResponse,
    ) -> Result<()> {
        if let Some(url) = &resp.new_url {
            doc.set_attr(form, "action", url.clone())?;
        }
        if let Some(button) = button {
            present_button(doc, button, resp.is_read)?;
        }
        if let Some(card) = doc.closest_class(form, CARD_CLASS) {
            if resp.is_read {
                doc.remove_classes(card, &UNREAD_CARD_CLASSES)?;
            } else {
                doc.add_classes(card, &UNREAD_CARD_CLASSES)?;
            }
        }
        self.publish(
            doc,
            UnreadCountChanged {
                count: resp.unread_count,
            },
        )
    }

    fn submit_mark_all(
        &mut self,
        doc: &mut Document,
        mark_all: MarkAllForm,
        tasks: &mut JoinSet<Completion>,
    ) -> Result<()> {
        let MarkAllForm { form, button } = mark_all;
        if doc.is_disabled(button) {
            return Ok(());
        }

        doc.set_disabled(button, true)?;
        let text = doc.element(button)?.text().to_string();
        let children = doc.take_children(button)?;
        self.saved_label = Some(SavedLabel { text, children });
        doc.set_text(button, BUSY_LABEL)?;

        let action = doc.attr(form, "action").unwrap_or_default().to_string();
        let fields = doc.form_fields(form);
        let backend = Arc::clone(&self.backend);
        tasks.spawn(async move {
            let result = backend.mark_all_read(&action, &fields).await;
            Completion::MarkAllRead { result }
        });
        Ok(())
    }

    pub fn on_mark_all_finished(
        &mut self,
        doc: &mut Document,
        result: uclases_lookup::Result<MarkAllReadResponse>,
    ) -> Result<()> {
        let Some(MarkAllForm { button, .. }) = self.mark_all else {
            return Ok(());
        };

        match result {
            Ok(resp) if resp.success => {
                if let Some(saved) = self.saved_label.take() {
                    for child in saved.children {
                        doc.remove(child)?;
                    }
                }
                match self.policy {
                    MarkAllPolicy::Reload => {
                        self.reload_requested = true;
                        Ok(())
                    }
                    MarkAllPolicy::Patch => self.mark_every_card_read(doc),
                }
            }
            Ok(resp) => {
                debug!(error = ?resp.error, "mark all as read rejected");
                self.restore_mark_all(doc, button)
            }
            Err(e) => {
                warn!(error = %e, "mark all as read failed");
                self.alerts.push(MARK_ALL_FAILED.to_string());
                self.restore_mark_all(doc, button)
            }
        }
    }

    fn mark_every_card_read(&mut self, doc: &mut Document) -> Result<()> {
        for card in doc.query_all_class(doc.root(), CARD_CLASS) {
            doc.remove_classes(card, &UNREAD_CARD_CLASSES)?;

            let Some(form) = doc.query_class(card, MARK_FORM_CLASS) else {
                continue;
            };
            let Some(button) = doc.query_tag(form, "button") else {
                continue;
            };
            present_button(doc, button, true)?;

            if let Some(action) = doc.attr(form, "action") {
                let rewritten = action.replace(MARK_READ_SEGMENT, MARK_UNREAD_SEGMENT);
                doc.set_attr(form, "action", rewritten)?;
            }
        }
        self.publish(doc, UnreadCountChanged { count: 0 })
    }

    fn restore_mark_all(&mut self, doc: &mut Document, button: NodeId) -> Result<()> {
        if let Some(saved) = self.saved_label.take() {
            doc.set_text(button, saved.text)?;
            doc.replace_children(button, saved.children)?;
        }
        doc.set_disabled(button, false)
    }

    fn publish(&mut self, doc: &mut Document, event: UnreadCountChanged) -> Result<()> {
        for observer in &self.observers {
            observer.on_unread_count_changed(doc, event)?;
        }
        // Nobody listening is fine.
        let _ = self.updates.send(event);
        Ok(())
    }
}

fn present_button(doc: &mut Document, button: NodeId, is_read: bool) -> Result<()> {
    let (class_name, label) = if is_read {
        (READ_BUTTON_CLASS, READ_LABEL)
    } else {
        (UNREAD_BUTTON_CLASS, UNREAD_LABEL)
    };
    doc.set_class_name(button, class_name)?;
    doc.remove_children(button)?;
    doc.set_text(button, label)
}

#[cfg(test)]
mod tests;
