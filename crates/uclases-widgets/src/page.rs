use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};
use uclases_core::dom::{Document, NodeId};
use uclases_core::{
    AutocompleteDefaults, MarkAllPolicy, MarkAllReadResponse, MatchItem, Result,
    ToggleReadResponse,
};
use uclases_lookup::{MatchSource, NotificationBackend, fetch_matches};

use crate::autocomplete::config::CONTAINER_ATTR;
use crate::autocomplete::{Autocomplete, SearchRequest, WidgetId};
use crate::notifications::NotificationToggler;

/// Keys the widgets react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

/// A user interaction delivered to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The text of `target` changed to `value`.
    Input { target: NodeId, value: String },
    Focus(NodeId),
    KeyDown { target: NodeId, key: Key },
    Click(NodeId),
    Submit(NodeId),
}

/// Result of a background task, handled back on the page.
#[derive(Debug)]
pub enum Completion {
    DebounceElapsed {
        widget: WidgetId,
        generation: u64,
        term: String,
    },
    Matches {
        widget: WidgetId,
        seq: u64,
        items: Vec<MatchItem>,
    },
    ToggleRead {
        form: NodeId,
        result: uclases_lookup::Result<ToggleReadResponse>,
    },
    MarkAllRead {
        result: uclases_lookup::Result<MarkAllReadResponse>,
    },
}

/// One page: its document, the widgets living on it and their pending
/// timers and requests.
///
/// All document mutation happens on the caller's thread through
/// [`dispatch`](Self::dispatch), [`pump`](Self::pump) and
/// [`settle`](Self::settle); background tasks only report back.
pub struct Page {
    doc: Document,
    defaults: AutocompleteDefaults,
    source: Arc<dyn MatchSource>,
    widgets: Vec<Autocomplete>,
    notifications: Option<NotificationToggler>,
    tasks: JoinSet<Completion>,
}

impl Page {
    pub fn new(doc: Document, source: Arc<dyn MatchSource>) -> Self {
        Self {
            doc,
            defaults: AutocompleteDefaults::default(),
            source,
            widgets: Vec::new(),
            notifications: None,
            tasks: JoinSet::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: AutocompleteDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Enable the notification read-state toggles on this page.
    pub fn with_notifications(
        mut self,
        backend: Arc<dyn NotificationBackend>,
        policy: MarkAllPolicy,
    ) -> Self {
        let toggler = NotificationToggler::attach(&self.doc, backend, policy);
        debug!(observers = toggler.observer_count(), "notification toggles attached");
        self.notifications = Some(toggler);
        self
    }

    // ─── Initialization ────────────────────────────────────

    /// Bulk initializer: every `[data-autocomplete]` container not yet
    /// initialized. Returns how many instances were created.
    pub fn init_all(&mut self) -> usize {
        self.init_matching(CONTAINER_ATTR)
    }

    /// Bulk initializer over containers carrying attribute `attr`.
    pub fn init_matching(&mut self, attr: &str) -> usize {
        let containers = self.doc.query_all_attr(self.doc.root(), attr);
        let created = containers
            .into_iter()
            .filter(|c| self.init_one(*c).is_some())
            .count();
        info!(created, "autocomplete containers initialized");
        created
    }

    /// Initialize a single container, e.g. one inserted after page load.
    /// Invalid or already initialized containers are skipped silently.
    pub fn init_one(&mut self, container: NodeId) -> Option<WidgetId> {
        let id = WidgetId(self.widgets.len());
        match Autocomplete::attach(&mut self.doc, container, id, &self.defaults) {
            Ok(widget) => {
                self.widgets.push(widget);
                Some(id)
            }
            Err(e) => {
                debug!(%container, reason = %e, "skipping autocomplete container");
                None
            }
        }
    }

    // ─── Accessors ─────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for hosts inserting markup after load.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn widgets(&self) -> &[Autocomplete] {
        &self.widgets
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Autocomplete> {
        self.widgets.get(id.0)
    }

    pub fn widget_for(&self, container: NodeId) -> Option<&Autocomplete> {
        self.widgets.iter().find(|w| w.container() == container)
    }

    pub fn notifications(&self) -> Option<&NotificationToggler> {
        self.notifications.as_ref()
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        self.notifications
            .as_mut()
            .map(NotificationToggler::take_alerts)
            .unwrap_or_default()
    }

    pub fn reload_requested(&self) -> bool {
        self.notifications
            .as_ref()
            .is_some_and(NotificationToggler::reload_requested)
    }

    pub fn has_pending_work(&self) -> bool {
        !self.tasks.is_empty()
    }

    // ─── Events ────────────────────────────────────────────

    pub fn dispatch(&mut self, event: UiEvent) {
        if let Err(e) = self.try_dispatch(event) {
            warn!(error = %e, "failed to handle page event");
        }
    }

    fn try_dispatch(&mut self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::Input { target, value } => match self.widget_index_by_input(target) {
                Some(i) => self.widgets[i].on_input(&mut self.doc, &value, &mut self.tasks)?,
                None => self.doc.set_value(target, value)?,
            },
            UiEvent::Focus(target) => {
                if let Some(i) = self.widget_index_by_input(target) {
                    self.widgets[i].on_focus(&self.doc, &mut self.tasks);
                }
            }
            UiEvent::KeyDown { target, key } => {
                if let Some(i) = self.widget_index_by_input(target) {
                    self.widgets[i].on_key(&mut self.doc, &key)?;
                }
            }
            UiEvent::Click(target) => {
                for widget in &mut self.widgets {
                    widget.on_click(&mut self.doc, target)?;
                }
            }
            UiEvent::Submit(form) => {
                let intercepted = match self.notifications.as_mut() {
                    Some(n) => n.on_submit(&mut self.doc, form, &mut self.tasks)?,
                    None => false,
                };
                if !intercepted {
                    self.doc.submit_form(form);
                }
            }
        }
        Ok(())
    }

    fn widget_index_by_input(&self, target: NodeId) -> Option<usize> {
        self.widgets.iter().position(|w| w.input() == target)
    }

    // ─── Background completions ────────────────────────────

    /// Handle completions that are already available without waiting.
    /// Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(joined) = self.tasks.try_join_next() {
            if self.on_joined(joined) {
                handled += 1;
            }
        }
        handled
    }

    /// Handle completions until no timer or request is pending.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.on_joined(joined);
        }
    }

    fn on_joined(&mut self, joined: std::result::Result<Completion, JoinError>) -> bool {
        match joined {
            Ok(completion) => {
                if let Err(e) = self.handle(completion) {
                    warn!(error = %e, "failed to apply background result");
                }
                true
            }
            Err(e) if e.is_cancelled() => false,
            Err(e) => {
                warn!(error = %e, "background task failed");
                false
            }
        }
    }

    fn handle(&mut self, completion: Completion) -> Result<()> {
        match completion {
            Completion::DebounceElapsed {
                widget,
                generation,
                term,
            } => {
                let Some(w) = self.widgets.get_mut(widget.0) else {
                    return Ok(());
                };
                if let Some(request) = w.on_debounce_elapsed(&mut self.doc, generation, &term)? {
                    self.spawn_lookup(request);
                }
            }
            Completion::Matches { widget, seq, items } => {
                if let Some(w) = self.widgets.get_mut(widget.0) {
                    w.on_matches(&mut self.doc, seq, &items)?;
                }
            }
            Completion::ToggleRead { form, result } => {
                if let Some(n) = self.notifications.as_mut() {
                    n.on_toggle_finished(&mut self.doc, form, result)?;
                }
            }
            Completion::MarkAllRead { result } => {
                if let Some(n) = self.notifications.as_mut() {
                    n.on_mark_all_finished(&mut self.doc, result)?;
                }
            }
        }
        Ok(())
    }

    fn spawn_lookup(&mut self, request: SearchRequest) {
        let source = Arc::clone(&self.source);
        self.tasks.spawn(async move {
            let items = fetch_matches(
                source.as_ref(),
                &request.url,
                &request.query,
                request.max_results,
            )
            .await;
            Completion::Matches {
                widget: request.widget,
                seq: request.seq,
                items,
            }
        });
    }
}
