use crate::animation::index::MutableTimelineIndex;
use crate::animation::keyframes::TimelineDescriptors;
use crate::animation::timeline::{DEFAULT_TIMELINE, Timeline};
use crate::eval::behaviors::apply_behaviors;
use crate::foundation::core::{ElementKey, InstanceId, NodeIdx, Vec3};
use crate::layout::sizing::Sizing;
use crate::layout::solver::{LayoutCache, solve_layout};
use crate::layout::spec::ComputedLayout;
use crate::scene::cache::SelectorCache;
use crate::scene::element::{Element, ElementArena, ElementKind};
use crate::scene::flatten::FlatTree;
use crate::scene::model::{Document, DocumentDef};
use crate::session::config::Config;
use crate::session::events::{EventSink, RuntimeEvent};
use crate::session::expand::expand_tree;
use crate::session::frame::FrameCtx;
use crate::session::output::{RenderedChild, RenderedNode};
use crate::session::registry::InstanceRegistry;
use crate::session::states::StateStore;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// One runtime instance: a document's live element tree, its timelines, caches, and guests.
///
/// The root instance is owned by a [`crate::Runtime`]; guests are owned by their host instance,
/// keyed by id, and referenced from component nodes by id only.
#[derive(Debug)]
pub struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) host: Option<InstanceId>,
    pub(crate) def: DocumentDef,
    pub(crate) config: Config,
    pub(crate) arena: ElementArena,
    pub(crate) descriptors: Rc<TimelineDescriptors>,
    pub(crate) mutable_index: MutableTimelineIndex,
    pub(crate) timelines: BTreeMap<String, Timeline>,
    pub(crate) flat: FlatTree,
    pub(crate) selectors: SelectorCache,
    pub(crate) horizons: BTreeSet<NodeIdx>,
    pub(crate) guests: BTreeMap<InstanceId, Instance>,
    pub(crate) layouts: LayoutCache,
    pub(crate) states: StateStore,
    pub(crate) container: Vec3,
    pub(crate) sizing: Sizing,
    advanced_at: Option<f64>,
    mounted: bool,
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        host: Option<InstanceId>,
        document: Document,
        config: Config,
        container: Vec3,
        events: &mut dyn EventSink,
    ) -> Self {
        let def = document.into_def();
        let arena = ElementArena::from_def(&def.template);
        let descriptors = Rc::new(def.timelines.clone());
        let mut timelines: BTreeMap<String, Timeline> = descriptors
            .iter()
            .map(|(name, d)| (name.clone(), Timeline::new(name.clone(), d)))
            .collect();
        if let Some(tl) = timelines.get_mut(DEFAULT_TIMELINE) {
            tl.set_looping(config.looping);
        }
        let states = StateStore::new(&def.states, &config.states);
        let mut inst = Self {
            id,
            host,
            mutable_index: MutableTimelineIndex::build(&descriptors),
            descriptors,
            timelines,
            arena,
            def,
            flat: FlatTree::default(),
            selectors: SelectorCache::default(),
            horizons: BTreeSet::new(),
            guests: BTreeMap::new(),
            layouts: LayoutCache::new(),
            states,
            container,
            sizing: config.sizing,
            config,
            advanced_at: None,
            mounted: false,
        };
        inst.rebuild_flat();
        events.emit(RuntimeEvent::ComponentInitialized { instance: id });
        inst
    }

    /// Instance id.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Host instance, `None` for the root.
    pub fn host(&self) -> Option<InstanceId> {
        self.host
    }

    /// Configuration this instance was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Document definition this instance was built from.
    pub fn document(&self) -> &DocumentDef {
        &self.def
    }

    /// Live element tree.
    pub fn arena(&self) -> &ElementArena {
        &self.arena
    }

    /// Current flattened tree.
    pub fn flat(&self) -> &FlatTree {
        &self.flat
    }

    /// Element at `idx`.
    pub fn element(&self, idx: NodeIdx) -> Option<&Element> {
        self.arena.get(idx)
    }

    /// Most recent computed geometry of `idx`.
    pub fn layout(&self, idx: NodeIdx) -> Option<&ComputedLayout> {
        self.layouts.get(&idx)
    }

    /// Current value of a public state.
    pub fn get_state(&self, name: &str) -> Option<&Value> {
        self.states.get(name)
    }

    /// Public state surface.
    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// Timeline by name.
    pub fn timeline(&self, name: &str) -> Option<&Timeline> {
        self.timelines.get(name)
    }

    /// All timelines.
    pub fn timelines(&self) -> impl Iterator<Item = &Timeline> {
        self.timelines.values()
    }

    /// Directly owned guests.
    pub fn guests(&self) -> impl Iterator<Item = &Instance> {
        self.guests.values()
    }

    /// Return `true` after the first render.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Horizon elements.
    pub fn horizons(&self) -> &BTreeSet<NodeIdx> {
        &self.horizons
    }

    /// This instance or a transitive guest with `id`.
    pub fn find(&self, id: InstanceId) -> Option<&Instance> {
        if self.id == id {
            return Some(self);
        }
        self.guests.values().find_map(|g| g.find(id))
    }

    /// Write a public state and raise `state:set` when it changed.
    pub(crate) fn set_state(
        &mut self,
        name: &str,
        value: Value,
        events: &mut dyn EventSink,
    ) -> bool {
        if !self.states.set(name, value.clone()) {
            return false;
        }
        events.emit(RuntimeEvent::StateSet {
            instance: self.id,
            name: name.to_owned(),
            value,
        });
        true
    }

    pub(crate) fn rebuild_flat(&mut self) {
        self.flat.rebuild(&self.arena, &self.horizons);
        self.selectors.clear(self.flat.generation());
    }

    fn advance_timelines(&mut self, now_ms: f64) {
        if self.advanced_at == Some(now_ms) {
            return;
        }
        self.advanced_at = Some(now_ms);
        for tl in self.timelines.values_mut() {
            tl.advance(now_ms);
        }
    }

    /// First render: lifecycle notifications around a forced full render.
    pub(crate) fn mount(&mut self, ctx: &mut FrameCtx<'_>) {
        ctx.events.emit(RuntimeEvent::WillMount { instance: self.id });
        if self.config.autoplay {
            if let Some(tl) = self.timelines.get_mut(DEFAULT_TIMELINE) {
                tl.play();
            }
        }
        ctx.forced_full(|ctx| self.render(ctx));
        self.mounted = true;
        ctx.events.emit(RuntimeEvent::DidMount { instance: self.id });
    }

    /// Full render: expansion, flat-tree rebuild, then behaviors.
    pub(crate) fn render(&mut self, ctx: &mut FrameCtx<'_>) {
        expand_tree(self, ctx, true);
        self.rebuild_flat();
        self.states.take_dirty();
        self.advance_timelines(ctx.now_ms);
        apply_behaviors(self, ctx, None);
        for guest in self.guests.values_mut() {
            if guest.states.take_dirty() {
                apply_behaviors(guest, ctx, None);
            }
        }
    }

    /// Incremental render: behaviors over the mutable index, then guests.
    pub(crate) fn patch(&mut self, ctx: &mut FrameCtx<'_>, delta: &mut BTreeSet<ElementKey>) {
        self.advance_timelines(ctx.now_ms);
        apply_behaviors(self, ctx, Some(delta));
        for guest in self.guests.values_mut() {
            guest.patch(ctx, delta);
        }
    }

    /// Layout pass over this instance and, recursively, its guests.
    ///
    /// Guests are laid out against their component node's computed size.
    pub(crate) fn layout_pass(&mut self, mut delta: Option<&mut BTreeSet<ElementKey>>) {
        let sizing = if self.host.is_none() {
            self.sizing
        } else {
            Sizing::Normal
        };
        let moved = solve_layout(
            &self.arena,
            self.container,
            sizing,
            &self.horizons,
            &mut self.layouts,
        );
        if let Some(d) = delta.as_deref_mut() {
            d.extend(moved.into_iter().map(|node| ElementKey {
                instance: self.id,
                node,
            }));
        }
        let hosted: Vec<(InstanceId, Vec3)> = self
            .flat
            .nodes()
            .iter()
            .filter_map(|&idx| {
                let g = self.arena.get(idx)?.guest()?;
                Some((g, self.layouts.get(&idx).map_or(Vec3::ZERO, |l| l.size)))
            })
            .collect();
        for (g, size) in hosted {
            if let Some(guest) = self.guests.get_mut(&g) {
                guest.container = size;
                guest.layout_pass(delta.as_deref_mut());
            }
        }
    }

    /// Destroy guests depth-first, then release this instance.
    pub(crate) fn destroy(&mut self, events: &mut dyn EventSink, registry: &mut InstanceRegistry) {
        events.emit(RuntimeEvent::WillUnmount { instance: self.id });
        for (_, mut guest) in std::mem::take(&mut self.guests) {
            guest.destroy(events, registry);
        }
        registry.release(self.id);
        self.mounted = false;
    }

    pub(crate) fn destroy_guests(&mut self, ids: Vec<InstanceId>, ctx: &mut FrameCtx<'_>) {
        for id in ids {
            if let Some(mut guest) = self.guests.remove(&id) {
                guest.destroy(ctx.events, ctx.registry);
            }
        }
    }

    /// Swap in a new document, keeping playback and state values whose names survive.
    pub(crate) fn replace_document(&mut self, document: Document, ctx: &mut FrameCtx<'_>) {
        let ids: Vec<InstanceId> = self.guests.keys().copied().collect();
        self.destroy_guests(ids, ctx);

        let def = document.into_def();
        let mut overrides = self.config.states.clone();
        for (k, v) in self.states.values() {
            if def.states.contains_key(k) {
                overrides.insert(k.clone(), v.clone());
            }
        }
        self.states = StateStore::new(&def.states, &overrides);
        self.arena = ElementArena::from_def(&def.template);
        self.descriptors = Rc::new(def.timelines.clone());
        self.mutable_index = MutableTimelineIndex::build(&self.descriptors);
        let mut timelines = BTreeMap::new();
        for (name, d) in self.descriptors.iter() {
            let tl = match self.timelines.remove(name) {
                Some(mut tl) => {
                    tl.refresh_bounds(d);
                    tl
                }
                None => Timeline::new(name.clone(), d),
            };
            timelines.insert(name.clone(), tl);
        }
        self.timelines = timelines;
        self.def = def;
        self.horizons.clear();
        self.layouts.clear();
        self.rebuild_flat();
        ctx.values.invalidate();
        tracing::debug!(instance = %self.id, "document replaced");
    }

    /// Rendered form of this instance's root.
    pub fn rendered(&self) -> RenderedNode {
        let root = self.arena.root();
        self.render_node(root, true).unwrap_or_else(|| RenderedNode {
            key: ElementKey {
                instance: self.id,
                node: root,
            },
            name: String::new(),
            attributes: BTreeMap::new(),
            layout: None,
            children: Vec::new(),
        })
    }

    /// Rendered form of `idx`, or `None` when control flow omits it.
    pub fn rendered_node(&self, idx: NodeIdx) -> Option<RenderedNode> {
        self.render_node(idx, idx == self.arena.root())
    }

    fn render_node(&self, idx: NodeIdx, force_present: bool) -> Option<RenderedNode> {
        let e = self.arena.get(idx)?;
        if !force_present && !e.is_present() {
            return None;
        }
        let (name, children) = match &e.kind {
            ElementKind::Primitive(tag) => {
                let children = if self.horizons.contains(&idx) {
                    Vec::new()
                } else {
                    e.children
                        .iter()
                        .filter_map(|&c| self.render_child(c))
                        .collect()
                };
                (tag.clone(), children)
            }
            ElementKind::Component { guest, .. } => {
                let children = guest
                    .and_then(|g| self.guests.get(&g))
                    .map(|g| vec![RenderedChild::Node(g.rendered())])
                    .unwrap_or_default();
                ("div".to_owned(), children)
            }
            ElementKind::Text(_) | ElementKind::Unknown(_) => return None,
        };
        Some(RenderedNode {
            key: ElementKey {
                instance: self.id,
                node: idx,
            },
            name,
            attributes: e.attributes.clone(),
            layout: self.layouts.get(&idx).cloned(),
            children,
        })
    }

    fn render_child(&self, idx: NodeIdx) -> Option<RenderedChild> {
        match &self.arena.get(idx)?.kind {
            ElementKind::Text(s) => Some(RenderedChild::Text(s.clone())),
            _ => self.render_node(idx, false).map(RenderedChild::Node),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/instance.rs"]
mod tests;
