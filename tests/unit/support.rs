use crate::eval::control_flow::PlaceholderSource;
use crate::eval::values::KeyframeValueBuilder;
use crate::eval::vanity::VanityRegistry;
use crate::foundation::core::{NodeIdx, Vec3};
use crate::scene::model::Document;
use crate::session::config::Config;
use crate::session::events::EventLog;
use crate::session::frame::FrameCtx;
use crate::session::instance::Instance;
use crate::session::registry::InstanceRegistry;
use serde_json::{Value, json};

/// One root instance plus the collaborators a frame borrows.
pub(crate) struct Harness {
    pub(crate) inst: Instance,
    pub(crate) values: KeyframeValueBuilder,
    pub(crate) events: EventLog,
    pub(crate) registry: InstanceRegistry,
    pub(crate) vanities: VanityRegistry,
    pub(crate) placeholders: PlaceholderSource,
}

impl Harness {
    pub(crate) fn new(doc: Value) -> Self {
        Self::with_config(doc, Config::default())
    }

    pub(crate) fn with_config(doc: Value, config: Config) -> Self {
        let mut registry = InstanceRegistry::new();
        let mut events = EventLog::default();
        let id = registry.allocate();
        let inst = Instance::new(
            id,
            None,
            Document::from_value(doc).unwrap(),
            config,
            Vec3::new(100.0, 100.0, 0.0),
            &mut events,
        );
        Self {
            inst,
            values: KeyframeValueBuilder::default(),
            events,
            registry,
            vanities: VanityRegistry::default(),
            placeholders: PlaceholderSource::default(),
        }
    }

    /// The instance and a non-forced full-render frame at `now_ms`.
    pub(crate) fn split(&mut self, now_ms: f64) -> (&mut Instance, FrameCtx<'_>) {
        (
            &mut self.inst,
            FrameCtx {
                now_ms,
                values: &mut self.values,
                events: &mut self.events,
                registry: &mut self.registry,
                vanities: &self.vanities,
                placeholders: &mut self.placeholders,
                patch: false,
                force: false,
                skip_cache: false,
            },
        )
    }

    pub(crate) fn mount(&mut self) {
        let (inst, mut ctx) = self.split(0.0);
        inst.mount(&mut ctx);
    }

    /// First element whose `id` attribute is `id`.
    pub(crate) fn by_id(&self, id: &str) -> NodeIdx {
        let arena = &self.inst.arena;
        arena
            .preorder(arena.root())
            .into_iter()
            .find(|&i| arena.get(i).and_then(|e| e.identity()).as_deref() == Some(id))
            .unwrap()
    }
}

pub(crate) fn doc(template: Value, timelines: Value) -> Value {
    json!({ "template": template, "timelines": timelines })
}
