//! Structural properties: `controlFlow.if`, `controlFlow.repeat`, `controlFlow.placeholder`.

use crate::eval::dispatch::ApplyOutcome;
use crate::foundation::core::NodeIdx;
use crate::scene::element::{ElementArena, ElementKind, RepeatMemory};
use crate::scene::flatten::flatten;
use crate::scene::model::NodeDef;
use crate::scene::selector::Selector;
use crate::session::frame::FrameCtx;
use crate::session::instance::Instance;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Host override for placeholder substitution.
pub trait PlaceholderHook {
    /// Projection to insert for `key` instead of `surrogate`; `None` keeps the built-in copy.
    fn project(&mut self, key: &Value, surrogate: &NodeDef) -> Option<NodeDef>;
}

/// Pool of externally supplied surrogate sub-trees plus an optional projection hook.
#[derive(Default)]
pub struct PlaceholderSource {
    surrogates: Value,
    hook: Option<Box<dyn PlaceholderHook>>,
}

impl std::fmt::Debug for PlaceholderSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderSource")
            .field("surrogates", &self.surrogates)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl PlaceholderSource {
    /// Pool backed by `surrogates` (an array or an object of nodes).
    pub fn new(surrogates: Value) -> Self {
        Self {
            surrogates,
            hook: None,
        }
    }

    /// Install a projection hook.
    pub fn with_hook(mut self, hook: Box<dyn PlaceholderHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Current pool.
    pub fn surrogates(&self) -> &Value {
        &self.surrogates
    }

    /// Replace the pool.
    pub fn set_surrogates(&mut self, surrogates: Value) {
        self.surrogates = surrogates;
    }

    /// Surrogate for `key`: array index, object key, or first match of a selector query.
    pub fn lookup(&self, key: &Value) -> Option<NodeDef> {
        let raw = match (&self.surrogates, key) {
            (Value::Array(items), Value::Number(n)) => {
                items.get(usize::try_from(n.as_u64()?).ok()?)
            }
            (Value::Array(items), Value::String(s)) => match s.parse::<usize>() {
                Ok(i) => items.get(i),
                Err(_) => return query_surrogates(items, s),
            },
            (Value::Object(map), Value::String(s)) => map.get(s),
            (Value::Object(map), Value::Number(n)) => map.get(&n.to_string()),
            _ => None,
        }?;
        serde_json::from_value(raw.clone()).ok()
    }
}

fn query_surrogates(items: &[Value], selector: &str) -> Option<NodeDef> {
    let selector = Selector::parse(selector).ok()?;
    items.iter().find_map(|item| {
        let NodeDef::Element(def) = serde_json::from_value::<NodeDef>(item.clone()).ok()? else {
            return None;
        };
        let arena = ElementArena::from_def(&def);
        let flat = flatten(&arena, &BTreeSet::new());
        let hit = *selector.query(&arena, &flat).first()?;
        arena.snapshot(hit)
    })
}

/// Truthiness used by conditionals.
pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Show or omit `target`. The element stays matchable so a later value can reveal it.
///
/// The parent is reported as well: an omitted element has no output of its own, so the
/// parent's child list is what tells a renderer it went away.
pub(crate) fn apply_if(inst: &mut Instance, target: NodeIdx, value: &Value) -> ApplyOutcome {
    let Some(e) = inst.arena.get_mut(target) else {
        return ApplyOutcome::default();
    };
    let cond = truthy(value);
    if e.memory.condition == Some(cond) {
        return ApplyOutcome::default();
    }
    e.memory.condition = Some(cond);
    ApplyOutcome {
        changed: true,
        restructured: false,
        parent: e.parent,
    }
}

fn merge_payload(attributes: &mut BTreeMap<String, Value>, payload: &Value) {
    if let Value::Object(m) = payload {
        for (k, v) in m {
            attributes.insert(k.clone(), v.clone());
        }
    }
}

/// Repeat `target` once per item: the element itself is item 0, clones follow it.
///
/// Accepts a count or an array of payloads; object payloads are merged as attributes.
/// Applying a repeat to a clone is a no-op.
pub(crate) fn apply_repeat(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    target: NodeIdx,
    value: &Value,
) -> ApplyOutcome {
    let Some(e) = inst.arena.get(target) else {
        return ApplyOutcome::default();
    };
    if e.memory.repeat_of.is_some() {
        return ApplyOutcome::default();
    }
    if e.memory.repeat.as_ref().is_some_and(|r| r.applied == *value) {
        return ApplyOutcome::default();
    }
    let Some(parent) = e.parent else {
        tracing::warn!(node = target.0, "cannot repeat the template root");
        return ApplyOutcome::default();
    };
    let payloads: Vec<Value> = match value {
        Value::Number(n) => {
            let count = n.as_f64().unwrap_or(0.0).max(0.0) as usize;
            vec![Value::Null; count]
        }
        Value::Array(items) => items.clone(),
        Value::Null | Value::Bool(false) => Vec::new(),
        other => {
            tracing::warn!(node = target.0, value = %other, "unsupported repeat value");
            return ApplyOutcome::default();
        }
    };

    let (template, old_clones) = match &e.memory.repeat {
        Some(r) => (r.template.clone(), r.clones.clone()),
        None => match inst.arena.snapshot(target) {
            Some(t) => (t, Vec::new()),
            None => return ApplyOutcome::default(),
        },
    };
    let NodeDef::Element(template_def) = &template else {
        return ApplyOutcome::default();
    };

    let mut doomed = Vec::new();
    for c in old_clones {
        doomed.extend(inst.arena.remove_subtree(c));
    }
    inst.destroy_guests(doomed, ctx);

    let mut clones = Vec::with_capacity(payloads.len().saturating_sub(1));
    for payload in payloads.iter().skip(1) {
        let mut def = template_def.clone();
        merge_payload(&mut def.attributes, payload);
        let idx = inst.arena.insert_def(&NodeDef::Element(def), Some(parent));
        if let Some(clone) = inst.arena.get_mut(idx) {
            clone.memory.repeat_of = Some(target);
        }
        clones.push(idx);
    }

    if let Some(p) = inst.arena.get_mut(parent) {
        let at = p
            .children
            .iter()
            .position(|&c| c == target)
            .map_or(p.children.len(), |i| i + 1);
        p.children.splice(at..at, clones.iter().copied());
    }
    if let Some(src) = inst.arena.get_mut(target) {
        let mut attributes = template_def.attributes.clone();
        if let Some(first) = payloads.first() {
            merge_payload(&mut attributes, first);
        }
        src.attributes = attributes;
        src.memory.repeat_hidden = payloads.is_empty();
        src.memory.repeat = Some(RepeatMemory {
            template: template.clone(),
            clones,
            applied: value.clone(),
        });
    }
    tracing::debug!(node = target.0, count = payloads.len(), "repeat applied");
    ApplyOutcome {
        changed: true,
        restructured: true,
        parent: Some(parent),
    }
}

/// Substitute the surrogate selected by `key` into `target`, clearing its children first.
pub(crate) fn apply_placeholder(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    target: NodeIdx,
    key: &Value,
) -> ApplyOutcome {
    let Some(e) = inst.arena.get(target) else {
        return ApplyOutcome::default();
    };
    if e.memory.placeholder_key.as_ref() == Some(key) {
        return ApplyOutcome::default();
    }
    let Some(mut surrogate) = ctx.placeholders.lookup(key) else {
        tracing::debug!(node = target.0, %key, "no surrogate for placeholder key");
        return ApplyOutcome::default();
    };
    if let Some(hook) = ctx.placeholders.hook.as_mut() {
        if let Some(projected) = hook.project(key, &surrogate) {
            surrogate = projected;
        }
    }

    let mut doomed = inst.arena.replace_children(target, &[]);
    match surrogate {
        NodeDef::Text(s) => {
            doomed.extend(inst.arena.replace_children(target, &[NodeDef::Text(s)]));
        }
        NodeDef::Element(def) => {
            if let Some(e) = inst.arena.get_mut(target) {
                if let (ElementKind::Primitive(tag), Value::String(new_tag)) =
                    (&mut e.kind, &def.element_name)
                {
                    if !new_tag.is_empty() {
                        *tag = new_tag.clone();
                    }
                }
                e.attributes.extend(def.attributes.clone());
            }
            doomed.extend(inst.arena.replace_children(target, &def.children));
        }
    }
    inst.destroy_guests(doomed, ctx);
    if let Some(e) = inst.arena.get_mut(target) {
        e.memory.placeholder_key = Some(key.clone());
    }
    tracing::debug!(node = target.0, %key, "placeholder substituted");
    ApplyOutcome {
        changed: true,
        restructured: true,
        parent: None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/control_flow.rs"]
mod tests;
