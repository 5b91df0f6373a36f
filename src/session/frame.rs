use crate::eval::control_flow::PlaceholderSource;
use crate::eval::values::ValueBuilder;
use crate::eval::vanity::VanityRegistry;
use crate::session::events::EventSink;
use crate::session::registry::InstanceRegistry;

/// Per-call context threaded through expansion, behaviors, and dispatch.
///
/// `now_ms` is read from the shared clock once per render; nothing below reads time on its own.
pub(crate) struct FrameCtx<'a> {
    pub(crate) now_ms: f64,
    pub(crate) values: &'a mut dyn ValueBuilder,
    pub(crate) events: &'a mut dyn EventSink,
    pub(crate) registry: &'a mut InstanceRegistry,
    pub(crate) vanities: &'a VanityRegistry,
    pub(crate) placeholders: &'a mut PlaceholderSource,
    pub(crate) patch: bool,
    pub(crate) force: bool,
    pub(crate) skip_cache: bool,
}

impl FrameCtx<'_> {
    /// Run `f` as a forced full render, restoring the caller's mode afterwards.
    pub(crate) fn forced_full<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = (self.patch, self.force);
        self.patch = false;
        self.force = true;
        let out = f(self);
        (self.patch, self.force) = saved;
        out
    }
}
