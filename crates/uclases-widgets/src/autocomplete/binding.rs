use uclases_core::dom::{Document, EventKind, HIDDEN_CLASS, NodeId};
use uclases_core::{MatchItem, Result};

use super::config::{LABEL_ATTR, SELECT_ATTR, VALUE_ATTR};

/// How a selection is written back into the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// `select[multiple]`: selections accumulate.
    MultiSelect,
    /// Plain `select`: exactly one option stays selected.
    SingleSelect,
    /// No select: the id goes into the hidden value field.
    HiddenField,
}

/// The form elements receiving the user's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundTarget {
    select: Option<NodeId>,
    hidden: Option<NodeId>,
    multiple: bool,
}

impl BoundTarget {
    /// Find the optional select and hidden field inside `container`.
    pub fn discover(doc: &Document, container: NodeId) -> Self {
        let select = doc.query_attr(container, SELECT_ATTR);
        let multiple = select
            .and_then(|s| doc.get(s))
            .is_some_and(|el| el.has_attr("multiple"));
        Self {
            select,
            hidden: doc.query_attr(container, VALUE_ATTR),
            multiple,
        }
    }

    pub fn mode(&self) -> BindingMode {
        match (self.select, self.multiple) {
            (Some(_), true) => BindingMode::MultiSelect,
            (Some(_), false) => BindingMode::SingleSelect,
            (None, _) => BindingMode::HiddenField,
        }
    }

    pub fn select(&self) -> Option<NodeId> {
        self.select
    }

    pub fn hidden(&self) -> Option<NodeId> {
        self.hidden
    }

    /// Hide the select and return the text the visible input should start
    /// with, if the bound fields already carry a selection.
    pub fn prepare(&self, doc: &mut Document) -> Result<Option<String>> {
        if let Some(select) = self.select {
            doc.add_class(select, HIDDEN_CLASS)?;
            return Ok(Some(selected_labels(doc, select)));
        }
        match self.hidden {
            Some(hidden) if !doc.value(hidden).is_empty() => Ok(Some(
                doc.attr(hidden, LABEL_ATTR).unwrap_or_default().to_string(),
            )),
            _ => Ok(None),
        }
    }

    /// Write `item` into the bound fields and return the text the visible
    /// input should show afterwards.
    pub fn commit(&self, doc: &mut Document, item: &MatchItem) -> Result<String> {
        let value = item.id.as_value();

        if let Some(select) = self.select {
            let option = match find_option(doc, select, &value) {
                Some(option) => option,
                None => doc
                    .build("option")
                    .value(value.clone())
                    .text(item.label.clone())
                    .append_to(select)?,
            };

            if self.multiple {
                doc.set_selected(option, true)?;
            } else {
                for other in doc.options(select) {
                    doc.set_selected(other, other == option)?;
                }
            }
            doc.dispatch_event(select, EventKind::Change);
        }

        if let Some(hidden) = self.hidden {
            doc.set_value(hidden, value)?;
            doc.set_attr(hidden, LABEL_ATTR, item.label.clone())?;
        }

        Ok(match self.select {
            Some(select) => selected_labels(doc, select),
            None => item.label.clone(),
        })
    }

    /// Clear every bound field back to "nothing selected".
    pub fn reset(&self, doc: &mut Document) -> Result<()> {
        if let Some(select) = self.select {
            for option in doc.options(select) {
                doc.set_selected(option, false)?;
            }
            doc.dispatch_event(select, EventKind::Change);
        }

        if let Some(hidden) = self.hidden {
            doc.set_value(hidden, "")?;
            doc.remove_attr(hidden, LABEL_ATTR)?;
        }
        Ok(())
    }
}

fn find_option(doc: &Document, select: NodeId, value: &str) -> Option<NodeId> {
    doc.options(select)
        .into_iter()
        .find(|o| doc.value(*o) == value)
}

/// Comma-joined labels of the selected options, skipping blank ones.
pub fn selected_labels(doc: &Document, select: NodeId) -> String {
    doc.selected_options(select)
        .into_iter()
        .map(|o| doc.text_content(o).trim().to_string())
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
