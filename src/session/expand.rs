use crate::animation::timeline::{DEFAULT_TIMELINE, Timeline};
use crate::foundation::core::{InstanceId, NodeIdx, Vec3};
use crate::scene::element::ElementKind;
use crate::scene::model::Document;
use crate::session::frame::FrameCtx;
use crate::session::instance::Instance;

/// Wire parent links and establish composition for every component reference in `inst`.
///
/// New component nodes get a guest instance, rendered immediately. With `rerender_existing`,
/// already-expanded guests are re-pointed at this host and rendered again; their default
/// timeline restarts unless it was explicitly paused or finished at the current clock reading.
/// Invalid embedded documents and unknown node shapes are logged and left unexpanded.
pub(crate) fn expand_tree(inst: &mut Instance, ctx: &mut FrameCtx<'_>, rerender_existing: bool) {
    inst.arena.relink();
    for idx in expansion_order(inst) {
        let Some(e) = inst.arena.get(idx) else {
            continue;
        };
        match &e.kind {
            ElementKind::Component {
                document,
                guest: None,
                failed: false,
            } => {
                let document = document.clone();
                spawn_guest(inst, ctx, idx, document);
            }
            ElementKind::Component {
                guest: Some(g), ..
            } if rerender_existing => {
                let g = *g;
                refresh_guest(inst, ctx, idx, g);
            }
            ElementKind::Unknown(shape) => {
                tracing::warn!(node = idx.0, %shape, "unrecognized node left unexpanded");
            }
            _ => {}
        }
    }
}

// Pre-order over every slot kind, stopping at horizons.
fn expansion_order(inst: &Instance) -> Vec<NodeIdx> {
    let mut out = Vec::new();
    let mut stack = vec![inst.arena.root()];
    while let Some(idx) = stack.pop() {
        let Some(e) = inst.arena.get(idx) else {
            continue;
        };
        out.push(idx);
        if !inst.horizons.contains(&idx) {
            stack.extend(e.children.iter().rev().copied());
        }
    }
    out
}

fn container_of(inst: &Instance, idx: NodeIdx) -> Vec3 {
    inst.layouts.get(&idx).map_or(Vec3::ZERO, |l| l.size)
}

fn spawn_guest(
    inst: &mut Instance,
    ctx: &mut FrameCtx<'_>,
    idx: NodeIdx,
    document: serde_json::Value,
) {
    let doc = match Document::from_value(document) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(
                node = idx.0,
                error = %e,
                "embedded document is invalid; node left unexpanded"
            );
            if let Some(ElementKind::Component { failed, .. }) =
                inst.arena.get_mut(idx).map(|e| &mut e.kind)
            {
                *failed = true;
            }
            return;
        }
    };
    let id = ctx.registry.allocate();
    let mut guest = Instance::new(
        id,
        Some(inst.id),
        doc,
        inst.config.render_safe(),
        container_of(inst, idx),
        ctx.events,
    );
    guest.mount(ctx);
    inst.guests.insert(id, guest);
    if let Some(ElementKind::Component { guest, .. }) =
        inst.arena.get_mut(idx).map(|e| &mut e.kind)
    {
        *guest = Some(id);
    }
    tracing::debug!(host = %inst.id, guest = %id, node = idx.0, "guest instance created");
}

fn refresh_guest(inst: &mut Instance, ctx: &mut FrameCtx<'_>, idx: NodeIdx, id: InstanceId) {
    let container = container_of(inst, idx);
    let host = inst.id;
    let Some(guest) = inst.guests.get_mut(&id) else {
        return;
    };
    guest.host = Some(host);
    guest.container = container;
    if guest.config.autoplay {
        if let Some(tl) = guest.timelines.get_mut(DEFAULT_TIMELINE) {
            restart_default(tl, ctx.now_ms);
        }
    }
    guest.render(ctx);
}

// A finished timeline wraps back to 0 only after the clock moved past the instant it finished at.
fn restart_default(tl: &mut Timeline, now_ms: f64) {
    if tl.is_explicitly_paused() {
        return;
    }
    if tl.is_finished() {
        if tl.last_clock_ms() == Some(now_ms) {
            return;
        }
        tl.seek(0.0);
    } else if !tl.is_playing() {
        tl.seek(0.0);
    }
    tl.play();
}
