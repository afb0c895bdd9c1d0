use std::time::Duration;

use tracing::debug;
use uclases_core::dom::{Document, NodeId};
use uclases_core::{AutocompleteDefaults, Result, WidgetError};

// ─── Markup contract ─────────────────────────────────────────

/// Marker attribute opting a container in.
pub const CONTAINER_ATTR: &str = "data-autocomplete";
pub const URL_ATTR: &str = "data-autocomplete-url";
pub const MIN_LENGTH_ATTR: &str = "data-autocomplete-min-length";
pub const MAX_RESULTS_ATTR: &str = "data-autocomplete-max-results";
pub const AUTO_SUBMIT_ATTR: &str = "data-autocomplete-auto-submit";
/// Set once a container has been initialized.
pub const READY_ATTR: &str = "data-autocomplete-ready";

pub const INPUT_ATTR: &str = "data-autocomplete-input";
pub const RESULTS_ATTR: &str = "data-autocomplete-results";
pub const SELECT_ATTR: &str = "data-autocomplete-select";
pub const VALUE_ATTR: &str = "data-autocomplete-value";
pub const CLEAR_ATTR: &str = "data-autocomplete-clear";
/// Display label stored next to the hidden field's value.
pub const LABEL_ATTR: &str = "data-autocomplete-label";

/// Per-container settings, read once from the container's attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    pub url: String,
    pub min_length: usize,
    pub max_results: usize,
    pub auto_submit: bool,
    pub debounce: Duration,
    pub empty_label: String,
}

impl ContainerConfig {
    pub fn from_element(
        doc: &Document,
        container: NodeId,
        defaults: &AutocompleteDefaults,
    ) -> Result<Self> {
        let el = doc.element(container)?;
        let url = el
            .attr(URL_ATTR)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(WidgetError::MissingAttribute(URL_ATTR))?;

        Ok(Self {
            url: url.to_string(),
            min_length: parse_count(el.attr(MIN_LENGTH_ATTR), MIN_LENGTH_ATTR, defaults.min_length),
            max_results: parse_count(
                el.attr(MAX_RESULTS_ATTR),
                MAX_RESULTS_ATTR,
                defaults.max_results,
            ),
            auto_submit: el.attr(AUTO_SUBMIT_ATTR) == Some("true"),
            debounce: Duration::from_millis(defaults.debounce_ms),
            empty_label: defaults.empty_label.clone(),
        })
    }
}

fn parse_count(raw: Option<&str>, attr: &str, default: usize) -> usize {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            debug!(attr, raw, "unparseable count, using default {default}");
            default
        }
    }
}
