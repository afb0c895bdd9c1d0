//! Server-backed autocomplete bound to a hidden field or a select.
//!
//! One [`Autocomplete`] per container: keystrokes go through a
//! [`Debouncer`], elapsed timers become [`SearchRequest`]s that the page
//! turns into lookups, responses are rendered into the results element and
//! a clicked row is committed into the [`BoundTarget`].

pub mod binding;
pub mod config;
pub mod render;

use tokio::task::JoinSet;
use tracing::debug;
use uclases_core::dom::{Document, NodeId};
use uclases_core::{AutocompleteDefaults, MatchItem, Result, WidgetError};

pub use binding::{BindingMode, BoundTarget};
pub use config::ContainerConfig;
pub use render::ResultRow;

use crate::debounce::Debouncer;
use crate::page::{Completion, Key};
use config::{CLEAR_ATTR, INPUT_ATTR, READY_ATTR, RESULTS_ATTR};
use render::{close_results, is_open, render_results};

/// Index of an instance within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    Searching,
    ShowingResults,
}

/// A lookup the page should run on behalf of a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub widget: WidgetId,
    pub seq: u64,
    pub url: String,
    pub query: String,
    pub max_results: usize,
}

/// What a click meant to one widget.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Outside,
    Inside,
    Cleared,
    Selected(MatchItem),
}

#[derive(Debug)]
pub struct Autocomplete {
    id: WidgetId,
    container: NodeId,
    config: ContainerConfig,
    input: NodeId,
    results: NodeId,
    clear_button: Option<NodeId>,
    target: BoundTarget,
    debouncer: Debouncer,
    state: WidgetState,
    last_seq: u64,
    awaiting: Option<u64>,
    rows: Vec<ResultRow>,
}

impl Autocomplete {
    /// Validate `container` and wire an instance to it. Nothing in the
    /// document changes unless every requirement is met.
    pub fn attach(
        doc: &mut Document,
        container: NodeId,
        id: WidgetId,
        defaults: &AutocompleteDefaults,
    ) -> Result<Self> {
        if doc.attr(container, READY_ATTR) == Some("true") {
            return Err(WidgetError::AlreadyInitialized(container));
        }
        let config = ContainerConfig::from_element(doc, container, defaults)?;
        let input = doc
            .query_attr(container, INPUT_ATTR)
            .ok_or(WidgetError::MissingElement(INPUT_ATTR))?;
        let results = doc
            .query_attr(container, RESULTS_ATTR)
            .ok_or(WidgetError::MissingElement(RESULTS_ATTR))?;
        let clear_button = doc.query_attr(container, CLEAR_ATTR);
        let target = BoundTarget::discover(doc, container);

        if let Some(text) = target.prepare(doc)? {
            doc.set_value(input, text)?;
        }
        close_results(doc, results)?;
        doc.set_attr(container, READY_ATTR, "true")?;

        Ok(Self {
            id,
            container,
            debouncer: Debouncer::new(config.debounce),
            config,
            input,
            results,
            clear_button,
            target,
            state: WidgetState::Idle,
            last_seq: 0,
            awaiting: None,
            rows: Vec::new(),
        })
    }

    // ─── Accessors ─────────────────────────────────────────

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn results(&self) -> NodeId {
        self.results
    }

    pub fn clear_button(&self) -> Option<NodeId> {
        self.clear_button
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn target(&self) -> &BoundTarget {
        &self.target
    }

    pub fn mode(&self) -> BindingMode {
        self.target.mode()
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        is_open(doc, self.results)
    }

    // ─── Trigger ───────────────────────────────────────────

    pub fn on_input(
        &mut self,
        doc: &mut Document,
        value: &str,
        tasks: &mut JoinSet<Completion>,
    ) -> Result<()> {
        doc.set_value(self.input, value)?;
        self.schedule_search(value.to_string(), tasks);
        Ok(())
    }

    pub fn on_focus(&mut self, doc: &Document, tasks: &mut JoinSet<Completion>) {
        let current = doc.value(self.input).trim().to_string();
        if current.chars().count() >= self.config.min_length {
            self.schedule_search(current, tasks);
        }
    }

    pub fn on_key(&mut self, doc: &mut Document, key: &Key) -> Result<()> {
        match key {
            Key::Escape => self.close(doc),
            Key::Other(_) => Ok(()),
        }
    }

    fn schedule_search(&mut self, term: String, tasks: &mut JoinSet<Completion>) {
        let widget = self.id;
        self.debouncer.schedule(tasks, move |generation| Completion::DebounceElapsed {
            widget,
            generation,
            term,
        });
    }

    /// The debounce delay passed. Returns the lookup to run, if any.
    pub fn on_debounce_elapsed(
        &mut self,
        doc: &mut Document,
        generation: u64,
        term: &str,
    ) -> Result<Option<SearchRequest>> {
        if !self.debouncer.is_current(generation) {
            debug!(widget = self.id.0, generation, "superseded debounce timer");
            return Ok(None);
        }
        self.debouncer.fired();

        let query = term.trim();
        if query.chars().count() < self.config.min_length {
            self.close(doc)?;
            return Ok(None);
        }

        self.last_seq += 1;
        self.awaiting = Some(self.last_seq);
        self.state = WidgetState::Searching;
        Ok(Some(SearchRequest {
            widget: self.id,
            seq: self.last_seq,
            url: self.config.url.clone(),
            query: query.to_string(),
            max_results: self.config.max_results,
        }))
    }

    // ─── Renderer ──────────────────────────────────────────

    /// A lookup finished. Only the latest request still awaited is
    /// rendered; returns whether this one was.
    pub fn on_matches(&mut self, doc: &mut Document, seq: u64, items: &[MatchItem]) -> Result<bool> {
        if self.awaiting != Some(seq) {
            debug!(widget = self.id.0, seq, latest = self.last_seq, "discarding stale lookup response");
            return Ok(false);
        }
        self.awaiting = None;
        self.rows = render_results(doc, self.results, items, &self.config.empty_label)?;
        self.state = WidgetState::ShowingResults;
        Ok(true)
    }

    /// Hide the results without touching the input or the selection.
    pub fn close(&mut self, doc: &mut Document) -> Result<()> {
        self.debouncer.cancel();
        self.awaiting = None;
        self.rows.clear();
        self.state = WidgetState::Idle;
        close_results(doc, self.results)
    }

    // ─── Selection ─────────────────────────────────────────

    pub fn on_click(&mut self, doc: &mut Document, target: NodeId) -> Result<ClickOutcome> {
        if !doc.contains(self.container, target) {
            self.close(doc)?;
            return Ok(ClickOutcome::Outside);
        }

        if let Some(clear) = self.clear_button {
            if doc.contains(clear, target) {
                self.reset(doc)?;
                return Ok(ClickOutcome::Cleared);
            }
        }

        let clicked = self
            .rows
            .iter()
            .find(|row| doc.contains(row.node, target))
            .map(|row| row.item.clone());
        match clicked {
            Some(item) => {
                self.select(doc, &item)?;
                Ok(ClickOutcome::Selected(item))
            }
            None => Ok(ClickOutcome::Inside),
        }
    }

    /// Commit `item` into the bound fields, close the list and auto-submit
    /// the owning form when configured to.
    pub fn select(&mut self, doc: &mut Document, item: &MatchItem) -> Result<()> {
        let text = self.target.commit(doc, item)?;
        doc.set_value(self.input, text)?;
        self.close(doc)?;

        if self.config.auto_submit {
            if let Some(form) = doc.form_of(self.input) {
                doc.submit_form(form);
            }
        }
        Ok(())
    }

    /// Back to the pre-selection state: nothing selected, empty input.
    pub fn reset(&mut self, doc: &mut Document) -> Result<()> {
        self.target.reset(doc)?;
        doc.set_value(self.input, "")?;
        self.close(doc)
    }
}
