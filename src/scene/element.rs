use crate::foundation::core::{InstanceId, NodeIdx};
use crate::layout::spec::LayoutSpec;
use crate::scene::model::{ElementDef, NodeDef};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute holding an element's identity (`#name` selectors).
pub const ID_ATTRIBUTE: &str = "id";
/// Attribute holding whitespace-separated classes (`.name` selectors).
pub const CLASS_ATTRIBUTE: &str = "class";
/// Attribute holding the nested style map.
pub const STYLE_ATTRIBUTE: &str = "style";

/// Tags that describe rather than draw; they carry no layout spec.
const NON_LAYOUT_TAGS: &[&str] = &["defs", "desc", "title", "metadata", "style", "script"];

/// What an arena slot holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Ordinary element with a tag name.
    Primitive(String),
    /// Text content.
    Text(String),
    /// Reference to an embedded document, expanded into a guest instance.
    Component {
        /// Embedded document, kept raw until expansion.
        document: Value,
        /// Guest instance once expanded.
        guest: Option<InstanceId>,
        /// Set when the embedded document failed validation; never retried.
        failed: bool,
    },
    /// Node whose `elementName` is neither a tag nor a document.
    Unknown(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RepeatMemory {
    pub(crate) template: NodeDef,
    pub(crate) clones: Vec<NodeIdx>,
    pub(crate) applied: Value,
}

/// Per-element runtime bookkeeping written by control-flow properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ElementMemory {
    pub(crate) condition: Option<bool>,
    pub(crate) repeat: Option<RepeatMemory>,
    pub(crate) repeat_of: Option<NodeIdx>,
    pub(crate) repeat_hidden: bool,
    pub(crate) placeholder_key: Option<Value>,
}

/// One element in an instance's arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Slot content kind.
    pub kind: ElementKind,
    /// Attributes, including a nested `style` map.
    pub attributes: BTreeMap<String, Value>,
    /// Ordered child slots.
    pub children: Vec<NodeIdx>,
    /// Parent slot; `None` for the root, whose parent is the host container.
    pub parent: Option<NodeIdx>,
    /// Declared layout; `None` for text and non-drawing nodes.
    pub layout: Option<LayoutSpec>,
    pub(crate) memory: ElementMemory,
}

impl Element {
    /// Tag name for primitives, `None` otherwise.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Primitive(name) => Some(name),
            _ => None,
        }
    }

    /// Identity attribute value, if it is a string or number.
    pub fn identity(&self) -> Option<String> {
        attribute_as_string(self.attributes.get(ID_ATTRIBUTE)?)
    }

    /// Whether the element takes part in selector matching.
    pub fn is_matchable(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Primitive(_) | ElementKind::Component { .. }
        )
    }

    /// Guest instance for expanded component references.
    pub fn guest(&self) -> Option<InstanceId> {
        match self.kind {
            ElementKind::Component { guest, .. } => guest,
            _ => None,
        }
    }

    /// Return `false` when control flow removed this element from output.
    pub fn is_present(&self) -> bool {
        self.memory.condition != Some(false) && !self.memory.repeat_hidden
    }
}

pub(crate) fn attribute_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Append-only element storage for one instance's template.
///
/// Slots are never reused, so an [`crate::ElementKey`] is never recycled for a different element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementArena {
    slots: Vec<Option<Element>>,
    root: NodeIdx,
}

impl ElementArena {
    /// Build an arena from a template root.
    pub fn from_def(root: &ElementDef) -> Self {
        let mut arena = Self {
            slots: Vec::new(),
            root: NodeIdx(0),
        };
        arena.root = arena.insert_element(root, None);
        arena
    }

    /// Root slot.
    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// Total slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live element at `idx`.
    pub fn get(&self, idx: NodeIdx) -> Option<&Element> {
        self.slots.get(idx.slot()).and_then(Option::as_ref)
    }

    /// Mutable live element at `idx`.
    pub fn get_mut(&mut self, idx: NodeIdx) -> Option<&mut Element> {
        self.slots.get_mut(idx.slot()).and_then(Option::as_mut)
    }

    /// Return `true` if `idx` holds a live element.
    pub fn contains(&self, idx: NodeIdx) -> bool {
        self.get(idx).is_some()
    }

    /// Insert a boundary node (recursively) as a detached subtree or under `parent`'s bookkeeping.
    ///
    /// The caller is responsible for placing the returned slot in a children list.
    pub(crate) fn insert_def(&mut self, def: &NodeDef, parent: Option<NodeIdx>) -> NodeIdx {
        match def {
            NodeDef::Text(s) => self.push(Element {
                kind: ElementKind::Text(s.clone()),
                attributes: BTreeMap::new(),
                children: Vec::new(),
                parent,
                layout: None,
                memory: ElementMemory::default(),
            }),
            NodeDef::Element(e) => self.insert_element(e, parent),
        }
    }

    fn insert_element(&mut self, def: &ElementDef, parent: Option<NodeIdx>) -> NodeIdx {
        let kind = match &def.element_name {
            Value::String(s) if !s.is_empty() => ElementKind::Primitive(s.clone()),
            Value::Object(_) => ElementKind::Component {
                document: def.element_name.clone(),
                guest: None,
                failed: false,
            },
            other => ElementKind::Unknown(other.clone()),
        };
        let layout = match &kind {
            ElementKind::Primitive(tag) if NON_LAYOUT_TAGS.contains(&tag.as_str()) => None,
            ElementKind::Primitive(_) | ElementKind::Component { .. } => {
                Some(LayoutSpec::default())
            }
            _ => None,
        };
        let idx = self.push(Element {
            kind,
            attributes: def.attributes.clone(),
            children: Vec::new(),
            parent,
            layout,
            memory: ElementMemory::default(),
        });
        let children: Vec<NodeIdx> = def
            .children
            .iter()
            .map(|c| self.insert_def(c, Some(idx)))
            .collect();
        if let Some(e) = self.get_mut(idx) {
            e.children = children;
        }
        idx
    }

    fn push(&mut self, e: Element) -> NodeIdx {
        let idx = NodeIdx(u32::try_from(self.slots.len()).unwrap_or(u32::MAX));
        self.slots.push(Some(e));
        idx
    }

    /// Pre-order walk from `from` (inclusive), skipping text/unknown slots.
    pub fn preorder(&self, from: NodeIdx) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(idx) = stack.pop() {
            let Some(e) = self.get(idx) else {
                continue;
            };
            if !e.is_matchable() {
                continue;
            }
            out.push(idx);
            stack.extend(e.children.iter().rev().copied());
        }
        out
    }

    /// Re-derive every parent link from the children lists.
    pub(crate) fn relink(&mut self) {
        let mut stack = vec![(self.root, None)];
        while let Some((idx, parent)) = stack.pop() {
            let Some(e) = self.get_mut(idx) else {
                continue;
            };
            e.parent = parent;
            for &c in e.children.iter().rev() {
                stack.push((c, Some(idx)));
            }
        }
    }

    /// Detach and free `idx` and its descendants. Returns guests owned by the removed subtree.
    pub(crate) fn remove_subtree(&mut self, idx: NodeIdx) -> Vec<InstanceId> {
        if let Some(parent) = self.get(idx).and_then(|e| e.parent) {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|&c| c != idx);
            }
        }
        let mut guests = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            let Some(e) = self.slots.get_mut(i.slot()).and_then(Option::take) else {
                continue;
            };
            if let Some(g) = e.guest() {
                guests.push(g);
            }
            stack.extend(e.children);
        }
        guests
    }

    /// Replace `idx`'s children with freshly inserted nodes. Returns guests owned by the old ones.
    pub(crate) fn replace_children(&mut self, idx: NodeIdx, defs: &[NodeDef]) -> Vec<InstanceId> {
        let old = self.get(idx).map(|e| e.children.clone()).unwrap_or_default();
        let mut guests = Vec::new();
        for c in old {
            guests.extend(self.remove_subtree(c));
        }
        let fresh: Vec<NodeIdx> = defs.iter().map(|d| self.insert_def(d, Some(idx))).collect();
        if let Some(e) = self.get_mut(idx) {
            e.children = fresh;
        }
        guests
    }

    /// Boundary form of the subtree at `idx`, as currently mutated.
    pub fn snapshot(&self, idx: NodeIdx) -> Option<NodeDef> {
        let e = self.get(idx)?;
        Some(match &e.kind {
            ElementKind::Text(s) => NodeDef::Text(s.clone()),
            ElementKind::Primitive(tag) => NodeDef::Element(ElementDef {
                element_name: Value::String(tag.clone()),
                attributes: e.attributes.clone(),
                children: e.children.iter().filter_map(|&c| self.snapshot(c)).collect(),
            }),
            ElementKind::Component { document, .. } => NodeDef::Element(ElementDef {
                element_name: document.clone(),
                attributes: e.attributes.clone(),
                children: Vec::new(),
            }),
            ElementKind::Unknown(v) => NodeDef::Element(ElementDef {
                element_name: v.clone(),
                attributes: e.attributes.clone(),
                children: Vec::new(),
            }),
        })
    }

    /// Set a plain attribute. Returns `true` if the stored value changed.
    pub fn set_attribute(&mut self, idx: NodeIdx, name: &str, value: Value) -> bool {
        let Some(e) = self.get_mut(idx) else {
            return false;
        };
        if e.attributes.get(name) == Some(&value) {
            return false;
        }
        e.attributes.insert(name.to_owned(), value);
        true
    }

    /// Set one key of the nested style map. Returns `true` if the stored value changed.
    pub fn set_style(&mut self, idx: NodeIdx, key: &str, value: Value) -> bool {
        let Some(e) = self.get_mut(idx) else {
            return false;
        };
        let style = e
            .attributes
            .entry(STYLE_ATTRIBUTE.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if !style.is_object() {
            *style = Value::Object(Map::new());
        }
        let Some(map) = style.as_object_mut() else {
            return false;
        };
        if map.get(key) == Some(&value) {
            return false;
        }
        map.insert(key.to_owned(), value);
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/element.rs"]
mod tests;
