use uclases_core::dom::{Document, HIDDEN_CLASS, NodeId};
use uclases_core::{MatchItem, Result};

pub const OPTION_CLASS: &str = "autocomplete-option";
pub const LABEL_CLASS: &str = "autocomplete-label";
pub const DESCRIPTION_CLASS: &str = "autocomplete-description";
pub const EMPTY_CLASS: &str = "autocomplete-empty";
pub const INDEX_ATTR: &str = "data-autocomplete-index";

/// A rendered result row and the item it selects.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub node: NodeId,
    pub item: MatchItem,
}

/// Replace the content of `results` with one row per item, or with a single
/// placeholder when `items` is empty, and reveal it.
pub fn render_results(
    doc: &mut Document,
    results: NodeId,
    items: &[MatchItem],
    empty_label: &str,
) -> Result<Vec<ResultRow>> {
    if items.is_empty() {
        let empty = doc.build("div").class(EMPTY_CLASS).text(empty_label).id();
        doc.replace_children(results, vec![empty])?;
        doc.remove_class(results, HIDDEN_CLASS)?;
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let node = result_row(doc, index, item)?;
        rows.push(ResultRow {
            node,
            item: item.clone(),
        });
    }

    doc.replace_children(results, rows.iter().map(|r| r.node).collect())?;
    doc.remove_class(results, HIDDEN_CLASS)?;
    Ok(rows)
}

fn result_row(doc: &mut Document, index: usize, item: &MatchItem) -> Result<NodeId> {
    let button = doc
        .build("button")
        .attr("type", "button")
        .attr(INDEX_ATTR, index.to_string())
        .class(OPTION_CLASS)
        .id();
    doc.build("span")
        .class(LABEL_CLASS)
        .text(item.label.clone())
        .append_to(button)?;
    if let Some(description) = item.visible_description() {
        doc.build("span")
            .class(DESCRIPTION_CLASS)
            .text(description)
            .append_to(button)?;
    }
    Ok(button)
}

pub fn close_results(doc: &mut Document, results: NodeId) -> Result<()> {
    doc.add_class(results, HIDDEN_CLASS)
}

pub fn is_open(doc: &Document, results: NodeId) -> bool {
    !doc.has_class(results, HIDDEN_CLASS)
}
