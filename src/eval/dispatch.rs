use crate::animation::timeline::{PlaybackCommand, Timeline};
use crate::eval::control_flow::{apply_if, apply_placeholder, apply_repeat, truthy};
use crate::eval::property::{LayoutField, PropertyKind};
use crate::eval::vanity::Vanity;
use crate::foundation::core::{NodeIdx, approx_eq};
use crate::layout::spec::SizeMode;
use crate::scene::model::NodeDef;
use crate::session::frame::FrameCtx;
use crate::session::instance::Instance;
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of applying one property value to one element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ApplyOutcome {
    /// The element's output differs from before.
    pub(crate) changed: bool,
    /// Elements were added, removed, or replaced; the flat tree must be rebuilt.
    pub(crate) restructured: bool,
    /// Parent whose child list changed as a side effect.
    pub(crate) parent: Option<NodeIdx>,
}

impl ApplyOutcome {
    fn from_changed(changed: bool) -> Self {
        Self {
            changed,
            ..Self::default()
        }
    }
}

/// Apply `value` to `name` on `target`. First match wins:
///
/// 1. a guest instance declaring a state of that name receives it through `set_state`;
/// 2. a vanity registered for the element's tag, then for any element;
/// 3. `style.<key>` writes the style map;
/// 4. anything else is a plain attribute.
pub(crate) fn apply_property(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    target: NodeIdx,
    name: &str,
    value: Value,
) -> ApplyOutcome {
    let Some(e) = inst.arena.get(target) else {
        return ApplyOutcome::default();
    };
    if let Some(guest) = e.guest().and_then(|g| inst.guests.get_mut(&g)) {
        if guest.states.declares(name) {
            return ApplyOutcome::from_changed(guest.set_state(name, value, ctx.events));
        }
    }
    let kind = PropertyKind::parse(name);
    if let Some(vanity) = ctx.vanities.lookup(e.tag(), &kind) {
        return apply_vanity(inst, ctx, target, vanity, value);
    }
    ApplyOutcome::from_changed(match kind {
        PropertyKind::Style(key) => inst.arena.set_style(target, &key, value),
        _ => inst.arena.set_attribute(target, name, value),
    })
}

fn apply_vanity(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    target: NodeIdx,
    vanity: Vanity,
    value: Value,
) -> ApplyOutcome {
    match vanity {
        Vanity::Layout(field, axis) => {
            let Some(spec) = inst.arena.get_mut(target).and_then(|e| e.layout.as_mut()) else {
                return ApplyOutcome::default();
            };
            let changed = if field == LayoutField::SizeMode {
                SizeMode::from_json(&value).is_some_and(|m| spec.set_size_mode(axis, m))
            } else {
                value
                    .as_f64()
                    .is_some_and(|v| spec.set_axis(field, axis, v))
            };
            ApplyOutcome::from_changed(changed)
        }
        Vanity::Opacity => ApplyOutcome::from_changed(set_opacity(inst, target, &value)),
        Vanity::OpacityAttribute => {
            let a = set_opacity(inst, target, &value);
            let b = inst.arena.set_attribute(target, "opacity", value);
            ApplyOutcome::from_changed(a || b)
        }
        Vanity::Shown => {
            let Some(spec) = inst.arena.get_mut(target).and_then(|e| e.layout.as_mut()) else {
                return ApplyOutcome::default();
            };
            let shown = truthy(&value);
            let changed = spec.shown != shown;
            spec.shown = shown;
            ApplyOutcome::from_changed(changed)
        }
        Vanity::Content => apply_content(inst, ctx, target, &value),
        Vanity::Children => apply_children(inst, ctx, target, value),
        Vanity::Playback => {
            apply_playback(inst, target, &value);
            ApplyOutcome::default()
        }
        Vanity::If => apply_if(inst, target, &value),
        Vanity::Repeat => apply_repeat(inst, ctx, target, &value),
        Vanity::Placeholder => apply_placeholder(inst, ctx, target, &value),
    }
}

fn set_opacity(inst: &mut Instance, target: NodeIdx, value: &Value) -> bool {
    let (Some(spec), Some(v)) = (
        inst.arena.get_mut(target).and_then(|e| e.layout.as_mut()),
        value.as_f64(),
    ) else {
        return false;
    };
    if approx_eq(spec.opacity, v) {
        return false;
    }
    spec.opacity = v;
    true
}

fn apply_content(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    target: NodeIdx,
    value: &Value,
) -> ApplyOutcome {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let fresh = [NodeDef::Text(text)];
    let current: Vec<NodeDef> = inst
        .arena
        .get(target)
        .map(|e| {
            e.children
                .iter()
                .filter_map(|&c| inst.arena.snapshot(c))
                .collect()
        })
        .unwrap_or_default();
    if current.as_slice() == fresh.as_slice() {
        return ApplyOutcome::default();
    }
    let had_elements = current.iter().any(|c| matches!(c, NodeDef::Element(_)));
    let doomed = inst.arena.replace_children(target, &fresh);
    inst.destroy_guests(doomed, ctx);
    ApplyOutcome {
        changed: true,
        restructured: had_elements,
        parent: None,
    }
}

fn apply_children(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    target: NodeIdx,
    value: Value,
) -> ApplyOutcome {
    let defs: Vec<NodeDef> = match value {
        Value::Array(_) => match serde_json::from_value(value) {
            Ok(defs) => defs,
            Err(e) => {
                tracing::warn!(node = target.0, error = %e, "children value is not a node list");
                return ApplyOutcome::default();
            }
        },
        Value::Null => Vec::new(),
        other => match serde_json::from_value::<NodeDef>(other) {
            Ok(one) => vec![one],
            Err(e) => {
                tracing::warn!(node = target.0, error = %e, "children value is not a node");
                return ApplyOutcome::default();
            }
        },
    };
    let current: Vec<NodeDef> = inst
        .arena
        .get(target)
        .map(|e| {
            e.children
                .iter()
                .filter_map(|&c| inst.arena.snapshot(c))
                .collect()
        })
        .unwrap_or_default();
    if current == defs {
        return ApplyOutcome::default();
    }
    let doomed = inst.arena.replace_children(target, &defs);
    inst.destroy_guests(doomed, ctx);
    ApplyOutcome {
        changed: true,
        restructured: true,
        parent: None,
    }
}

/// Transition named timelines: those of the target's guest if it has one, else the owner's.
///
/// A string applies to every timeline; an object maps timeline name → command.
fn apply_playback(inst: &mut Instance, target: NodeIdx, value: &Value) {
    let guest = inst.arena.get(target).and_then(|e| e.guest());
    let timelines: &mut BTreeMap<String, Timeline> =
        match guest.and_then(|g| inst.guests.get_mut(&g)) {
            Some(g) => &mut g.timelines,
            None => &mut inst.timelines,
        };
    let parse = |v: &Value| {
        let cmd = v.as_str().and_then(PlaybackCommand::parse);
        if cmd.is_none() {
            tracing::warn!(value = %v, "unknown playback command");
        }
        cmd
    };
    match value {
        Value::Object(per_timeline) => {
            for (name, v) in per_timeline {
                if let (Some(tl), Some(cmd)) = (timelines.get_mut(name), parse(v)) {
                    tl.command(cmd);
                }
            }
        }
        other => {
            if let Some(cmd) = parse(other) {
                for tl in timelines.values_mut() {
                    tl.command(cmd);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/dispatch.rs"]
mod tests;
