use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::event::{DispatchedEvent, EventKind};
use crate::error::{Result, WidgetError};

/// Handle to an element. Slots of removed elements are reused, and the
/// generation keeps an old handle from resolving to the slot's new tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index)
    }
}

/// One element of the tree.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    text: String,
    value: String,
    selected: bool,
    disabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    /// Own text, not including descendants.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current form value (inputs, options).
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// The page: an arena of elements rooted at `body`, plus a log of the
/// events widgets dispatched on it.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    events: Vec<DispatchedEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                element: Some(Element::new("body")),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            events: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.element.as_mut())
    }

    pub fn element(&self, id: NodeId) -> Result<&Element> {
        self.get(id).ok_or(WidgetError::NodeNotFound(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.get_mut(id).ok_or(WidgetError::NodeNotFound(id))
    }

    /// Number of live elements, attached or not.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    // ─── Construction ──────────────────────────────────────

    /// Create a detached element, reusing the slot of a removed one if any.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Some(Element::new(tag));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.element = element;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            element,
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Start building an element fluently.
    pub fn build(&mut self, tag: &str) -> ElementBuilder<'_> {
        let id = self.create_element(tag);
        ElementBuilder { doc: self, id }
    }

    /// Append `child` to `parent`, moving it out of its previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.element(parent)?;
        if parent == child || self.contains(child, parent) {
            return Err(WidgetError::TreeCycle { parent, child });
        }
        self.detach(child)?;
        self.element_mut(child)?.parent = Some(parent);
        self.element_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Remove `node` from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.element(node)?.parent {
            self.element_mut(parent)?.children.retain(|c| *c != node);
        }
        self.element_mut(node)?.parent = None;
        Ok(())
    }

    /// Detach every child of `parent` and hand them back, still alive.
    pub fn take_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        let children = std::mem::take(&mut self.element_mut(parent)?.children);
        for child in &children {
            self.element_mut(*child)?.parent = None;
        }
        Ok(children)
    }

    /// Detach `node` and free it along with its whole subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(WidgetError::RootRemoval);
        }
        self.detach(node)?;
        let mut doomed = self.descendants(node);
        doomed.push(node);
        for id in doomed {
            if let Some(slot) = self.slots.get_mut(id.index) {
                slot.element = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
        Ok(())
    }

    pub fn remove_children(&mut self, parent: NodeId) -> Result<()> {
        for child in self.take_children(parent)? {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Replace the whole child list of `parent`. Previous children that are
    /// not part of `children` are freed.
    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) -> Result<()> {
        for &child in &children {
            if self.contains(child, parent) {
                return Err(WidgetError::TreeCycle { parent, child });
            }
        }
        for child in &children {
            self.detach(*child)?;
        }
        self.remove_children(parent)?;
        for child in children {
            self.append_child(parent, child)?;
        }
        Ok(())
    }

    // ─── Attributes, classes, state ────────────────────────

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<()> {
        self.element_mut(id)?.attributes.remove(name);
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.element_mut(id)?.classes.insert(class.to_string());
        Ok(())
    }

    pub fn add_classes(&mut self, id: NodeId, classes: &[&str]) -> Result<()> {
        for class in classes {
            self.add_class(id, class)?;
        }
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.element_mut(id)?.classes.remove(class);
        Ok(())
    }

    pub fn remove_classes(&mut self, id: NodeId, classes: &[&str]) -> Result<()> {
        for class in classes {
            self.remove_class(id, class)?;
        }
        Ok(())
    }

    /// Replace the whole class list.
    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) -> Result<()> {
        self.element_mut(id)?.classes = class_name.split_whitespace().map(str::to_string).collect();
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        self.element_mut(id)?.text = text.into();
        Ok(())
    }

    /// Text of `id` and all its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(el) = self.get(id) {
            out.push_str(&el.text);
        }
        for node in self.descendants(id) {
            if let Some(el) = self.get(node) {
                out.push_str(&el.text);
            }
        }
        out
    }

    pub fn value(&self, id: NodeId) -> &str {
        self.get(id).map(Element::value).unwrap_or_default()
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        self.element_mut(id)?.value = value.into();
        Ok(())
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Element::is_selected)
    }

    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<()> {
        self.element_mut(id)?.selected = selected;
        Ok(())
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Element::is_disabled)
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<()> {
        self.element_mut(id)?.disabled = disabled;
        Ok(())
    }

    // ─── Queries ───────────────────────────────────────────

    /// All descendants of `root` in pre-order, excluding `root` itself.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(root) {
            Some(el) => el.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(el) = self.get(node) {
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    fn query(&self, root: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|n| self.get(*n).is_some_and(&pred))
    }

    fn query_all(&self, root: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|n| self.get(*n).is_some_and(&pred))
            .collect()
    }

    /// First descendant carrying attribute `name`.
    pub fn query_attr(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.query(root, |el| el.has_attr(name))
    }

    pub fn query_all_attr(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.query_all(root, |el| el.has_attr(name))
    }

    pub fn query_class(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.query(root, |el| el.has_class(class))
    }

    pub fn query_all_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.query_all(root, |el| el.has_class(class))
    }

    pub fn query_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.query(root, |el| el.tag == tag)
    }

    /// Element whose `id` attribute equals `id`.
    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(self.root, |el| el.attr("id") == Some(id))
    }

    /// Whether `node` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.get(n).and_then(Element::parent);
        }
        false
    }

    /// Nearest inclusive ancestor matching `pred`.
    pub fn closest(&self, node: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            let el = self.get(n)?;
            if pred(el) {
                return Some(n);
            }
            current = el.parent;
        }
        None
    }

    pub fn closest_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.closest(node, |el| el.has_class(class))
    }

    /// The form owning `node`, if any.
    pub fn form_of(&self, node: NodeId) -> Option<NodeId> {
        self.closest(node, |el| el.tag == "form")
    }

    /// `option` elements of a select, in document order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.query_all(select, |el| el.tag == "option")
    }

    pub fn selected_options(&self, select: NodeId) -> Vec<NodeId> {
        self.options(select)
            .into_iter()
            .filter(|o| self.is_selected(*o))
            .collect()
    }

    /// Name/value pairs of every named input inside `form`.
    pub fn form_fields(&self, form: NodeId) -> Vec<(String, String)> {
        self.query_all(form, |el| el.tag == "input" && el.has_attr("name"))
            .into_iter()
            .filter_map(|n| {
                let el = self.get(n)?;
                Some((el.attr("name")?.to_string(), el.value.clone()))
            })
            .collect()
    }

    // ─── Events ────────────────────────────────────────────

    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) {
        self.events.push(DispatchedEvent { target, kind });
    }

    pub fn submit_form(&mut self, form: NodeId) {
        self.dispatch_event(form, EventKind::Submit);
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Fluent element construction, mostly for assembling pages.
pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    id: NodeId,
}

impl ElementBuilder<'_> {
    pub fn attr(self, name: &str, value: impl Into<String>) -> Self {
        if let Some(el) = self.doc.get_mut(self.id) {
            el.attributes.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn class(self, class_name: &str) -> Self {
        if let Some(el) = self.doc.get_mut(self.id) {
            el.classes.extend(class_name.split_whitespace().map(str::to_string));
        }
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        if let Some(el) = self.doc.get_mut(self.id) {
            el.text = text.into();
        }
        self
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        if let Some(el) = self.doc.get_mut(self.id) {
            el.value = value.into();
        }
        self
    }

    pub fn selected(self, selected: bool) -> Self {
        if let Some(el) = self.doc.get_mut(self.id) {
            el.selected = selected;
        }
        self
    }

    /// Finish building, leaving the element detached.
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Finish building and append to `parent`.
    pub fn append_to(self, parent: NodeId) -> Result<NodeId> {
        let id = self.id;
        self.doc.append_child(parent, id)?;
        Ok(id)
    }
}
