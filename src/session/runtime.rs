use crate::animation::timeline::{Clock, Timeline};
use crate::eval::control_flow::{PlaceholderHook, PlaceholderSource};
use crate::eval::values::{KeyframeValueBuilder, ValueBuilder};
use crate::eval::vanity::VanityRegistry;
use crate::foundation::core::{ElementKey, InstanceId, Size, Vec3};
use crate::foundation::error::{MarionetteError, MarionetteResult};
use crate::layout::spec::ComputedLayout;
use crate::scene::element::Element;
use crate::scene::model::Document;
use crate::session::config::{Config, InteractionMode, RenderOptions};
use crate::session::events::{EventLog, RuntimeEvent};
use crate::session::frame::FrameCtx;
use crate::session::instance::Instance;
use crate::session::methods::{Method, MethodTable};
use crate::session::output::{Patch, RenderedTree};
use crate::session::registry::InstanceRegistry;
use crate::session::states::{StateTransition, StateTransitions};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Document migration applied at construction; failures leave the document untouched.
pub type Migration = Box<dyn FnOnce(Value) -> anyhow::Result<Value>>;

/// Host-facing driver: owns the root instance, the shared clock, and the collaborators.
pub struct Runtime {
    root: Instance,
    clock: Clock,
    services: Services,
    methods: MethodTable,
    transitions: StateTransitions,
    failed_handlers: HashSet<(String, String)>,
    destroyed: bool,
}

// Collaborators lent to every frame, kept apart from `root` so both can be borrowed at once.
struct Services {
    registry: InstanceRegistry,
    vanities: VanityRegistry,
    values: Box<dyn ValueBuilder>,
    events: EventLog,
    placeholders: PlaceholderSource,
}

impl Services {
    fn frame(&mut self, now_ms: f64, patch: bool, force: bool, skip_cache: bool) -> FrameCtx<'_> {
        FrameCtx {
            now_ms,
            values: self.values.as_mut(),
            events: &mut self.events,
            registry: &mut self.registry,
            vanities: &self.vanities,
            placeholders: &mut self.placeholders,
            patch,
            force,
            skip_cache,
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.root.id())
            .field("clock", &self.clock)
            .field("methods", &self.methods)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Runtime with default collaborators and a zero-sized container.
    pub fn new(document: Document, config: Config) -> Self {
        Self::builder(document).config(config).build()
    }

    /// Parse a document from JSON and build a runtime around it.
    pub fn from_json(document: &str, config: Config) -> MarionetteResult<Self> {
        Ok(Self::new(Document::from_json(document)?, config))
    }

    /// Start configuring a runtime.
    pub fn builder(document: Document) -> RuntimeBuilder {
        RuntimeBuilder::new(document)
    }

    /// Root instance.
    pub fn root(&self) -> &Instance {
        &self.root
    }

    /// Root instance id.
    pub fn id(&self) -> InstanceId {
        self.root.id()
    }

    /// Configuration of the root instance.
    pub fn config(&self) -> &Config {
        self.root.config()
    }

    /// Root or any transitive guest.
    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.root.find(id)
    }

    /// Instance registry.
    pub fn registry(&self) -> &InstanceRegistry {
        &self.services.registry
    }

    /// Current shared clock time.
    pub fn time_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Advance the shared clock.
    pub fn advance(&mut self, dt_ms: f64) {
        self.clock.advance(dt_ms);
    }

    /// Set the shared clock.
    pub fn set_time(&mut self, now_ms: f64) {
        self.clock.set(now_ms);
    }

    /// Root timeline by name.
    pub fn timeline(&self, name: &str) -> Option<&Timeline> {
        self.root.timeline(name)
    }

    /// Mutable root timeline, for direct play/pause/seek control.
    pub fn timeline_mut(&mut self, name: &str) -> Option<&mut Timeline> {
        self.root.timelines.get_mut(name)
    }

    /// Host container size.
    pub fn set_container(&mut self, size: Size) {
        self.root.container = Vec3::new(size.width, size.height, 0.0);
    }

    /// Replace the surrogate pool used by placeholders.
    pub fn set_surrogates(&mut self, surrogates: Value) {
        self.services.placeholders.set_surrogates(surrogates);
    }

    fn ensure_live(&self) -> MarionetteResult<()> {
        if self.destroyed {
            return Err(MarionetteError::evaluation("runtime was destroyed"));
        }
        Ok(())
    }

    fn tick_transitions(&mut self) {
        for (name, value) in self.transitions.tick(self.clock.now_ms()) {
            self.root.set_state(&name, value, &mut self.services.events);
        }
    }

    /// Full render. The first call mounts the root (forcing every behavior).
    #[tracing::instrument(skip(self))]
    pub fn render(&mut self, opts: RenderOptions) -> MarionetteResult<RenderedTree> {
        self.ensure_live()?;
        self.tick_transitions();
        self.root.sizing = opts.sizing.unwrap_or(self.root.config.sizing);
        let mut ctx =
            self.services
                .frame(self.clock.now_ms(), false, opts.force_apply, opts.skip_cache);
        if self.root.is_mounted() {
            self.root.render(&mut ctx);
        } else {
            self.root.mount(&mut ctx);
        }
        self.root.layout_pass(None);
        Ok(RenderedTree {
            root: self.root.rendered(),
        })
    }

    /// Incremental render: only elements whose output changed since the previous render.
    ///
    /// Mounts first when called before any full render.
    #[tracing::instrument(skip(self))]
    pub fn patch(&mut self) -> MarionetteResult<Patch> {
        self.ensure_live()?;
        if !self.root.is_mounted() {
            let tree = self.render(RenderOptions::forced())?;
            return Ok(Patch {
                changed: BTreeMap::from([(tree.root.key, tree.root)]),
            });
        }
        self.tick_transitions();
        let mut delta = BTreeSet::new();
        let mut ctx = self.services.frame(self.clock.now_ms(), true, false, false);
        self.root.patch(&mut ctx, &mut delta);
        self.root.layout_pass(Some(&mut delta));
        let changed = delta
            .into_iter()
            .filter_map(|key| {
                let node = self.root.find(key.instance)?.rendered_node(key.node)?;
                Some((key, node))
            })
            .collect();
        Ok(Patch { changed })
    }

    /// Write a root state, raising `state:set` when it changed.
    pub fn set_state(&mut self, name: &str, value: Value) -> bool {
        self.root.set_state(name, value, &mut self.services.events)
    }

    /// Read a root state.
    pub fn get_state(&self, name: &str) -> Option<&Value> {
        self.root.get_state(name)
    }

    /// Return every root state to its initial value, immediately or through a tween.
    pub fn reset_states(&mut self, transition: Option<StateTransition>) {
        let targets = self.root.states().initial().clone();
        let immediate: Vec<(String, Value)> = match transition {
            None => targets.into_iter().collect(),
            Some(tr) => {
                self.transitions
                    .schedule(self.root.states(), &targets, tr, self.clock.now_ms())
            }
        };
        for (name, value) in immediate {
            self.root.set_state(&name, value, &mut self.services.events);
        }
    }

    /// Bind a host callable under a method name used by `eventHandlers`.
    pub fn bind_method<F>(&mut self, name: impl Into<String>, method: F)
    where
        F: FnMut(&mut Runtime, &Value) -> anyhow::Result<()> + 'static,
    {
        let method: Method = Box::new(method);
        self.methods.bind(name, method);
    }

    /// Fire the handler declared for (`selector`, `event`). Returns `true` if a handler ran.
    ///
    /// Handlers only fire in [`InteractionMode::Live`]. A failing handler is logged the first time
    /// it fails for that pair, and its error is swallowed.
    pub fn dispatch_event(&mut self, selector: &str, event: &str, payload: &Value) -> bool {
        if self.destroyed || self.root.config.interaction_mode != InteractionMode::Live {
            return false;
        }
        let Some(handler) = self
            .root
            .def
            .event_handlers
            .get(selector)
            .and_then(|m| m.get(event))
            .map(|h| h.handler.clone())
        else {
            return false;
        };
        let Some(mut method) = self.methods.take(&handler) else {
            tracing::debug!(%selector, %event, %handler, "no method bound for handler");
            return false;
        };
        let result = method(self, payload);
        self.methods.restore(&handler, method);
        if let Err(e) = result {
            if self
                .failed_handlers
                .insert((selector.to_owned(), event.to_owned()))
            {
                tracing::warn!(%selector, %event, %handler, error = %e, "event handler failed");
            }
        }
        true
    }

    /// Stop rendering below every element matching `selector`. Returns the number marked.
    pub fn mark_horizon(&mut self, selector: &str) -> MarionetteResult<usize> {
        let hits = self.query(selector)?;
        let root = self.root.id();
        let count = hits.iter().filter(|k| k.instance == root).count();
        self.root
            .horizons
            .extend(hits.into_iter().filter(|k| k.instance == root).map(|k| k.node));
        self.root.rebuild_flat();
        Ok(count)
    }

    /// Hot editing: swap the root document and force a full render.
    pub fn replace_document(&mut self, document: Document) -> MarionetteResult<RenderedTree> {
        self.ensure_live()?;
        if !self.root.config.hot_editing {
            return Err(MarionetteError::validation(
                "replace_document requires hotEditing",
            ));
        }
        let mut ctx = self.services.frame(self.clock.now_ms(), false, true, true);
        self.root.replace_document(document, &mut ctx);
        self.render(RenderOptions {
            force_apply: true,
            skip_cache: true,
            ..RenderOptions::default()
        })
    }

    /// Root elements matching `selector`, in flat-tree order.
    pub fn query(&mut self, selector: &str) -> MarionetteResult<Vec<ElementKey>> {
        let id = self.root.id();
        let root = &mut self.root;
        Ok(root
            .selectors
            .query(selector, &root.arena, &root.flat)?
            .iter()
            .map(|&node| ElementKey { instance: id, node })
            .collect())
    }

    /// Element by key, in the root or any guest.
    pub fn element(&self, key: ElementKey) -> Option<&Element> {
        self.instance(key.instance)?.element(key.node)
    }

    /// Computed geometry by key.
    pub fn layout(&self, key: ElementKey) -> Option<&ComputedLayout> {
        self.instance(key.instance)?.layout(key.node)
    }

    /// Guest instance hosted at a component element.
    pub fn guest_at(&self, key: ElementKey) -> Option<&Instance> {
        let g = self.element(key)?.guest()?;
        self.instance(key.instance)?.guests.get(&g)
    }

    /// Destroy the root and, transitively, every guest. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.root.destroy(&mut self.services.events, &mut self.services.registry);
        self.destroyed = true;
    }

    /// Return `true` once destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Events raised since the last drain.
    pub fn events(&self) -> &[RuntimeEvent] {
        self.services.events.events()
    }

    /// Take every raised event.
    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        self.services.events.drain()
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    document: Document,
    config: Config,
    container: Size,
    values: Option<Box<dyn ValueBuilder>>,
    vanities: VanityRegistry,
    registry: InstanceRegistry,
    placeholders: PlaceholderSource,
    migration: Option<Migration>,
    start_ms: f64,
}

impl RuntimeBuilder {
    fn new(document: Document) -> Self {
        Self {
            document,
            config: Config::default(),
            container: Size::ZERO,
            values: None,
            vanities: VanityRegistry::default(),
            registry: InstanceRegistry::new(),
            placeholders: PlaceholderSource::default(),
            migration: None,
            start_ms: 0.0,
        }
    }

    /// Runtime configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Host container size seeding the root layout.
    pub fn container(mut self, size: Size) -> Self {
        self.container = size;
        self
    }

    /// Replace the default [`KeyframeValueBuilder`].
    pub fn value_builder(mut self, values: Box<dyn ValueBuilder>) -> Self {
        self.values = Some(values);
        self
    }

    /// Replace the default vanity table.
    pub fn vanities(mut self, vanities: VanityRegistry) -> Self {
        self.vanities = vanities;
        self
    }

    /// Share an instance registry instead of creating an isolated one.
    pub fn registry(mut self, registry: InstanceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Surrogate pool for placeholders.
    pub fn surrogates(mut self, surrogates: Value) -> Self {
        self.placeholders.set_surrogates(surrogates);
        self
    }

    /// Placeholder projection hook.
    pub fn placeholder_hook(mut self, hook: Box<dyn PlaceholderHook>) -> Self {
        let surrogates = self.placeholders.surrogates().clone();
        self.placeholders = PlaceholderSource::new(surrogates).with_hook(hook);
        self
    }

    /// Document migration run once before the instance is built.
    pub fn migrate<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Value) -> anyhow::Result<Value> + 'static,
    {
        self.migration = Some(Box::new(f));
        self
    }

    /// Initial shared clock time.
    pub fn start_at(mut self, now_ms: f64) -> Self {
        self.start_ms = now_ms;
        self
    }

    /// Build the runtime. The root is constructed but not mounted until the first render.
    pub fn build(self) -> Runtime {
        let document = match self.migration {
            Some(migrate) => migrate_document(self.document, migrate),
            None => self.document,
        };
        let mut registry = self.registry;
        let mut events = EventLog::default();
        let id = registry.allocate();
        let root = Instance::new(
            id,
            None,
            document,
            self.config,
            Vec3::new(self.container.width, self.container.height, 0.0),
            &mut events,
        );
        Runtime {
            root,
            clock: Clock::new(self.start_ms),
            services: Services {
                registry,
                vanities: self.vanities,
                values: self
                    .values
                    .unwrap_or_else(|| Box::new(KeyframeValueBuilder::default())),
                events,
                placeholders: self.placeholders,
            },
            methods: MethodTable::default(),
            transitions: StateTransitions::default(),
            failed_handlers: HashSet::new(),
            destroyed: false,
        }
    }
}

fn migrate_document(document: Document, migrate: Migration) -> Document {
    let migrated = document
        .to_value()
        .map_err(anyhow::Error::from)
        .and_then(migrate)
        .and_then(|v| Document::from_value(v).map_err(anyhow::Error::from));
    match migrated {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = %e, "document migration failed; using the document as given");
            document
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/runtime.rs"]
mod tests;
