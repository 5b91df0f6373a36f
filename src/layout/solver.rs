use crate::foundation::core::{Axis, NodeIdx, Size, Vec3};
use crate::layout::sizing::{Sizing, fit};
use crate::layout::spec::{ComputedLayout, LayoutSpec, SizeMode, compose};
use crate::scene::element::{Element, ElementArena};
use std::collections::{BTreeSet, HashMap};

/// Previously computed geometry per element, owned by one instance.
pub type LayoutCache = HashMap<NodeIdx, ComputedLayout>;

/// Recompute geometry for every laid-out element of `arena`, pre-order.
///
/// `container` seeds the root's parent size. `sizing` applies to the root only; callers pass
/// [`Sizing::Normal`] for guest instances. Elements without a layout spec, and everything beneath
/// them, are skipped, as is everything beneath a horizon.
///
/// Returns elements whose geometry is new or changed since the previous pass.
pub fn solve_layout(
    arena: &ElementArena,
    container: Vec3,
    sizing: Sizing,
    horizons: &BTreeSet<NodeIdx>,
    cache: &mut LayoutCache,
) -> Vec<NodeIdx> {
    cache.retain(|idx, _| arena.contains(*idx));

    let mut changed = Vec::new();
    let mut stack = vec![(arena.root(), container)];
    while let Some((idx, parent_size)) = stack.pop() {
        let Some(e) = arena.get(idx) else {
            continue;
        };
        let Some(spec) = &e.layout else {
            continue;
        };
        let preset = (idx == arena.root()).then_some(sizing);
        let next = compute_node(e, spec, parent_size, preset);
        let size = next.size;
        match cache.get(&idx) {
            Some(prev) if !prev.geometry_differs(&next) => {
                cache.insert(idx, next);
            }
            _ => {
                cache.insert(idx, next);
                changed.push(idx);
            }
        }
        if horizons.contains(&idx) {
            continue;
        }
        for &c in e.children.iter().rev() {
            stack.push((c, size));
        }
    }
    changed
}

fn resolve_size(e: &Element, spec: &LayoutSpec, parent: Vec3) -> Vec3 {
    let mut size = Vec3::ZERO;
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let i = axis.index();
        let v = match spec.size_mode[i] {
            SizeMode::Proportional => {
                parent[i] * spec.size_proportional[i] + spec.size_differential[i]
            }
            SizeMode::Absolute => spec.size_absolute[i],
            SizeMode::Auto => {
                let attr = match axis {
                    Axis::X => Some("width"),
                    Axis::Y => Some("height"),
                    Axis::Z => None,
                };
                attr.and_then(|a| e.attributes.get(a))
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or_else(|| parent[i])
            }
        };
        size[i] = v.max(0.0);
    }
    size
}

/// Geometry of one element given its parent's size and an optional root preset.
pub fn compute_node(
    e: &Element,
    spec: &LayoutSpec,
    parent: Vec3,
    preset: Option<Sizing>,
) -> ComputedLayout {
    let size = resolve_size(e, spec, parent);

    let mut translation = spec.align * parent - spec.mount * size + spec.translation;
    let mut scale = spec.scale;
    if let Some(sizing) = preset.filter(|s| *s != Sizing::Normal) {
        let f = fit(
            sizing,
            Size::new(parent.x, parent.y),
            Size::new(size.x, size.y),
        );
        scale.x = f.scale.x;
        scale.y = f.scale.y;
        translation.x += f.offset.x;
        translation.y += f.offset.y;
    }

    let pivot = spec.origin * size;
    let matrix = compose(translation, pivot, spec.rotation, scale);

    ComputedLayout {
        size,
        translation,
        scale,
        matrix,
        opacity: spec.opacity.clamp(0.0, 1.0),
        shown: spec.shown,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/solver.rs"]
mod tests;
