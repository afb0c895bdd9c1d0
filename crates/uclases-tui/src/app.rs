use std::fmt;
use std::sync::Arc;

use anyhow::{Result, bail};
use uclases_core::AutocompleteDefaults;
use uclases_core::dom::{Document, EventKind, NodeId};
use uclases_lookup::MatchSource;
use uclases_widgets::autocomplete::config::{
    AUTO_SUBMIT_ATTR, CLEAR_ATTR, CONTAINER_ATTR, INPUT_ATTR, LABEL_ATTR, RESULTS_ATTR,
    SELECT_ATTR, URL_ATTR, VALUE_ATTR,
};
use uclases_widgets::autocomplete::render::EMPTY_CLASS;
use uclases_widgets::autocomplete::ResultRow;
use uclases_widgets::{Autocomplete, Key, Page, UiEvent};

/// Which form field the demo container writes selections into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoMode {
    #[default]
    Hidden,
    Single,
    Multi,
}

impl fmt::Display for DemoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden field"),
            Self::Single => write!(f, "single select"),
            Self::Multi => write!(f, "multi select"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub url: String,
    pub mode: DemoMode,
    pub auto_submit: bool,
    pub defaults: AutocompleteDefaults,
}

/// One line of the bound-field panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundLine {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

/// Demo application state.
pub struct App {
    pub page: Page,
    pub mode: DemoMode,
    pub url: String,
    container: NodeId,
    input: NodeId,
    results: NodeId,
    select: Option<NodeId>,
    hidden: Option<NodeId>,
    clear_button: NodeId,

    /// Index into the current result rows.
    pub highlight: Option<usize>,
    pub status_message: String,
    pub submissions: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(source: Arc<dyn MatchSource>, options: DemoOptions) -> Result<Self> {
        let mut doc = Document::new();
        let root = doc.root();
        let form = doc.build("form").attr("action", "/demo/").append_to(root)?;

        let mut container = doc
            .build("div")
            .attr(CONTAINER_ATTR, "")
            .attr(URL_ATTR, options.url.clone());
        if options.auto_submit {
            container = container.attr(AUTO_SUBMIT_ATTR, "true");
        }
        let container = container.append_to(form)?;
        let input = doc
            .build("input")
            .attr(INPUT_ATTR, "")
            .attr("type", "text")
            .append_to(container)?;
        let results = doc.build("div").attr(RESULTS_ATTR, "").append_to(container)?;

        let (select, hidden) = match options.mode {
            DemoMode::Hidden => {
                let hidden = doc
                    .build("input")
                    .attr("type", "hidden")
                    .attr("name", "selection")
                    .attr(VALUE_ATTR, "")
                    .append_to(container)?;
                (None, Some(hidden))
            }
            DemoMode::Single | DemoMode::Multi => {
                let mut select = doc
                    .build("select")
                    .attr(SELECT_ATTR, "")
                    .attr("name", "selection");
                if options.mode == DemoMode::Multi {
                    select = select.attr("multiple", "");
                }
                (Some(select.append_to(container)?), None)
            }
        };
        let clear_button = doc
            .build("button")
            .attr(CLEAR_ATTR, "")
            .attr("type", "button")
            .text("×")
            .append_to(container)?;

        let mut page = Page::new(doc, source).with_defaults(options.defaults);
        if page.init_all() == 0 {
            bail!("demo container for {} failed to initialize", options.url);
        }

        Ok(Self {
            page,
            mode: options.mode,
            url: options.url,
            container,
            input,
            results,
            select,
            hidden,
            clear_button,
            highlight: None,
            status_message: "Type at least the minimum number of characters to search".to_string(),
            submissions: 0,
            should_quit: false,
        })
    }

    fn widget(&self) -> Option<&Autocomplete> {
        self.page.widget_for(self.container)
    }

    // ─── View ──────────────────────────────────────────────

    pub fn input_text(&self) -> &str {
        self.page.document().value(self.input)
    }

    pub fn is_open(&self) -> bool {
        self.widget().is_some_and(|w| w.is_open(self.page.document()))
    }

    pub fn rows(&self) -> &[ResultRow] {
        self.widget().map(Autocomplete::rows).unwrap_or_default()
    }

    /// Text of the "no results" row when that is what the list shows.
    pub fn placeholder(&self) -> Option<String> {
        let doc = self.page.document();
        doc.query_class(self.results, EMPTY_CLASS)
            .filter(|_| self.is_open())
            .map(|node| doc.text_content(node))
    }

    pub fn min_length(&self) -> usize {
        self.widget().map_or(0, |w| w.config().min_length)
    }

    /// Current contents of the bound form field(s).
    pub fn bound_lines(&self) -> Vec<BoundLine> {
        let doc = self.page.document();
        if let Some(select) = self.select {
            return doc
                .options(select)
                .into_iter()
                .map(|o| BoundLine {
                    label: doc.text_content(o),
                    value: doc.value(o).to_string(),
                    selected: doc.is_selected(o),
                })
                .collect();
        }
        self.hidden
            .map(|hidden| {
                let value = doc.value(hidden).to_string();
                vec![BoundLine {
                    label: doc.attr(hidden, LABEL_ATTR).unwrap_or_default().to_string(),
                    selected: !value.is_empty(),
                    value,
                }]
            })
            .unwrap_or_default()
    }

    // ─── Actions ───────────────────────────────────────────

    pub fn type_char(&mut self, c: char) {
        let mut value = self.input_text().to_string();
        value.push(c);
        self.set_input(value);
    }

    pub fn backspace(&mut self) {
        let mut value = self.input_text().to_string();
        if value.pop().is_some() {
            self.set_input(value);
        }
    }

    fn set_input(&mut self, value: String) {
        self.page.dispatch(UiEvent::Input {
            target: self.input,
            value,
        });
    }

    /// Move the highlight down (wraps).
    pub fn move_down(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.highlight = Some(match self.highlight {
                Some(i) => (i + 1) % len,
                None => 0,
            });
        }
    }

    /// Move the highlight up (wraps).
    pub fn move_up(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.highlight = Some(match self.highlight {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            });
        }
    }

    /// Click the highlighted row.
    pub fn activate(&mut self) {
        let Some(node) = self
            .highlight
            .and_then(|i| self.rows().get(i))
            .map(|row| row.node)
        else {
            return;
        };
        self.page.dispatch(UiEvent::Click(node));
    }

    pub fn escape(&mut self) {
        self.page.dispatch(UiEvent::KeyDown {
            target: self.input,
            key: Key::Escape,
        });
    }

    pub fn clear(&mut self) {
        self.page.dispatch(UiEvent::Click(self.clear_button));
        self.status_message = "Selection cleared".to_string();
    }

    /// Apply finished timers and lookups, then refresh derived state.
    pub fn on_tick(&mut self) {
        self.page.pump();

        let len = self.rows().len();
        self.highlight = match self.highlight {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };

        for event in self.page.document_mut().take_events() {
            match event.kind {
                EventKind::Submit => {
                    self.submissions += 1;
                    self.status_message = format!("Form submitted ({})", self.submissions);
                }
                EventKind::Change => {
                    self.status_message = "Selection changed".to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyModifiers};
    use uclases_core::MatchItem;

    use super::*;
    use crate::keys::handle_key;

    struct FakeSource {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MatchSource for FakeSource {
        async fn lookup(&self, _url: &str, query: &str) -> uclases_lookup::Result<Vec<MatchItem>> {
            self.queries.lock().unwrap().push(query.to_string());
            if query == "zz" {
                return Ok(Vec::new());
            }
            Ok(vec![
                MatchItem::new(1, "Alice").with_description("Tutora de Cálculo"),
                MatchItem::new(2, "Albert"),
            ])
        }
    }

    fn app(mode: DemoMode, auto_submit: bool) -> App {
        let source = Arc::new(FakeSource {
            queries: Mutex::new(Vec::new()),
        });
        App::new(
            source,
            DemoOptions {
                url: "/search/users".to_string(),
                mode,
                auto_submit,
                defaults: AutocompleteDefaults::default(),
            },
        )
        .unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, code, KeyModifiers::NONE);
    }

    async fn type_and_wait(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
        app.page.settle().await;
        app.on_tick();
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_shows_results_with_highlight() {
        let mut app = app(DemoMode::Hidden, false);
        type_and_wait(&mut app, "al").await;

        assert_eq!(app.input_text(), "al");
        assert!(app.is_open());
        assert_eq!(app.rows().len(), 2);
        assert_eq!(app.highlight, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_commits_highlighted_row() {
        let mut app = app(DemoMode::Hidden, false);
        type_and_wait(&mut app, "al").await;

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        app.on_tick();

        assert_eq!(app.input_text(), "Albert");
        assert!(!app.is_open());
        assert_eq!(app.highlight, None);
        assert_eq!(
            app.bound_lines(),
            vec![BoundLine {
                label: "Albert".to_string(),
                value: "2".to_string(),
                selected: true,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_wraps() {
        let mut app = app(DemoMode::Hidden, false);
        type_and_wait(&mut app, "al").await;
        press(&mut app, KeyCode::Up);
        assert_eq!(app.highlight, Some(1));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.highlight, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backspace_below_minimum_closes() {
        let mut app = app(DemoMode::Hidden, false);
        type_and_wait(&mut app, "al").await;
        press(&mut app, KeyCode::Backspace);
        app.page.settle().await;
        app.on_tick();

        assert_eq!(app.input_text(), "a");
        assert!(!app.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_results_placeholder() {
        let mut app = app(DemoMode::Hidden, false);
        type_and_wait(&mut app, "zz").await;
        assert_eq!(app.placeholder().as_deref(), Some("Sin resultados"));
        assert_eq!(app.highlight, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_and_ctrl_keys() {
        let mut app = app(DemoMode::Multi, false);
        type_and_wait(&mut app, "al").await;
        press(&mut app, KeyCode::Enter);
        app.on_tick();
        assert_eq!(app.status_message, "Selection changed");
        assert_eq!(app.bound_lines().len(), 1);

        type_and_wait(&mut app, "x").await;
        press(&mut app, KeyCode::Esc);
        assert!(!app.is_open());

        handle_key(&mut app, KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(app.input_text(), "");
        assert!(app.bound_lines().iter().all(|l| !l.selected));

        handle_key(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_submit_counts_submissions() {
        let mut app = app(DemoMode::Single, true);
        type_and_wait(&mut app, "al").await;
        press(&mut app, KeyCode::Enter);
        app.on_tick();
        assert_eq!(app.submissions, 1);
        assert_eq!(app.status_message, "Form submitted (1)");
    }
}
