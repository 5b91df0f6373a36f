use crate::animation::keyframes::{Keyframes, group_needs_expression_eval};
use crate::eval::dispatch::apply_property;
use crate::eval::property::PropertyKind;
use crate::eval::values::ValueRequest;
use crate::foundation::core::ElementKey;
use crate::session::expand::expand_tree;
use crate::session::frame::FrameCtx;
use crate::session::instance::Instance;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Apply every selector group that needs evaluation this frame.
///
/// Per timeline, per selector group: skip unless forced, the timeline is playing and not yet
/// past its end, or an expression keyframe brackets the current time. Structural properties run
/// before presentational ones, and the selector is resolved again for each phase so
/// presentational values land on the post-structural element set. Patch renders consider only
/// the mutable timeline index. Elements whose output changed are added to `delta` when given.
pub(crate) fn apply_behaviors(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    mut delta: Option<&mut BTreeSet<ElementKey>>,
) {
    let descriptors = if ctx.patch {
        inst.mutable_index.descriptors()
    } else {
        Rc::clone(&inst.descriptors)
    };

    for (timeline_name, descriptor) in descriptors.iter() {
        let Some(tl) = inst.timelines.get(timeline_name) else {
            continue;
        };
        let time_ms = tl.bounded_time_ms();
        let live = tl.is_playing() && (!tl.is_finished() || tl.just_finished());

        for (selector, group) in descriptor {
            if !(ctx.force || live || group_needs_expression_eval(group, time_ms)) {
                continue;
            }
            let (structural, presentational): (Vec<(&String, &Keyframes)>, Vec<_>) = group
                .iter()
                .partition(|(name, _)| PropertyKind::parse(name).is_structural());

            for phase in [structural, presentational] {
                if phase.is_empty() {
                    continue;
                }
                let targets = match inst.selectors.query(selector, &inst.arena, &inst.flat) {
                    Ok(t) => t.to_vec(),
                    Err(e) => {
                        tracing::warn!(%selector, error = %e, "skipping selector group");
                        break;
                    }
                };
                let mut restructured = false;
                for target in targets {
                    let key = ElementKey {
                        instance: inst.id,
                        node: target,
                    };
                    for &(name, keyframes) in &phase {
                        let value = ctx.values.resolve(&ValueRequest {
                            timeline: timeline_name,
                            time_ms,
                            element: key,
                            property: name,
                            keyframes,
                            group,
                            patch: ctx.patch,
                            skip_cache: ctx.skip_cache,
                            states: inst.states.values(),
                        });
                        let Some(value) = value else {
                            continue;
                        };
                        let outcome = apply_property(inst, ctx, target, name, value);
                        if let Some(d) = delta.as_deref_mut() {
                            if outcome.changed {
                                d.insert(key);
                            }
                            if let Some(parent) = outcome.parent {
                                d.insert(ElementKey {
                                    instance: inst.id,
                                    node: parent,
                                });
                            }
                        }
                        restructured |= outcome.restructured;
                    }
                }
                if restructured {
                    tracing::debug!(%selector, "structural change; rebuilding flat tree");
                    expand_tree(inst, ctx, false);
                    inst.rebuild_flat();
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/behaviors.rs"]
mod tests;
