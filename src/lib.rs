//! Marionette is the render, diff, and layout engine of a declarative animation runtime.
//!
//! A [`Document`] pairs an element template with named timelines of keyframed property
//! values. A [`Runtime`] turns it into a live element tree and keeps that tree in sync with a
//! shared clock:
//!
//! 1. **Expand**: component references (elements whose `elementName` is itself a document)
//!    become guest [`Instance`]s, each with its own tree, timelines, and public states.
//! 2. **Flatten**: each instance keeps a pre-order [`FlatTree`] that selectors are matched
//!    against, memoized by a [`SelectorCache`] until the tree is restructured.
//! 3. **Apply behaviors**: per timeline and selector group, keyframe values are resolved through
//!    a [`ValueBuilder`] and dispatched to elements. Control-flow properties (`controlFlow.if`,
//!    `controlFlow.repeat`, `controlFlow.placeholder`) restructure the tree before presentational
//!    properties land on the resulting element set.
//! 4. **Lay out**: a 3D [`LayoutSpec`] per element resolves to a [`ComputedLayout`] against its
//!    parent; the root may be fitted to the host container with a [`Sizing`] preset.
//!
//! [`Runtime::render`] produces a full [`RenderedTree`]; [`Runtime::patch`] produces a [`Patch`]
//! holding only the elements whose output changed, considering only properties in the
//! [`MutableTimelineIndex`].
//!
//! The crate is single-threaded and forbids `unsafe`.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation {
    pub(crate) mod ease;
    pub(crate) mod index;
    pub(crate) mod keyframes;
    pub(crate) mod timeline;
}

mod eval {
    pub(crate) mod behaviors;
    pub(crate) mod control_flow;
    pub(crate) mod dispatch;
    pub(crate) mod property;
    pub(crate) mod values;
    pub(crate) mod vanity;
}

mod foundation {
    pub(crate) mod core;
    pub(crate) mod error;
}

mod layout {
    pub(crate) mod sizing;
    pub(crate) mod solver;
    pub(crate) mod spec;
}

mod scene {
    pub(crate) mod cache;
    pub(crate) mod element;
    pub(crate) mod flatten;
    pub(crate) mod model;
    pub(crate) mod selector;
}

mod session {
    pub(crate) mod config;
    pub(crate) mod events;
    pub(crate) mod expand;
    pub(crate) mod frame;
    pub(crate) mod instance;
    pub(crate) mod methods;
    pub(crate) mod output;
    pub(crate) mod registry;
    pub(crate) mod runtime;
    pub(crate) mod states;
}

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
mod test_support;

pub use animation::ease::Ease;
pub use animation::index::{MutableTimelineIndex, is_mutable_property};
pub use animation::keyframes::{
    Bracket, Keyframe, KeyframeValue, Keyframes, PropertyGroup, TimelineDescriptor,
    TimelineDescriptors, descriptor_max_time, group_needs_expression_eval,
};
pub use animation::timeline::{Clock, DEFAULT_TIMELINE, PlaybackCommand, PlaybackStatus, Timeline};
pub use eval::control_flow::{PlaceholderHook, PlaceholderSource};
pub use eval::property::{LayoutField, PropertyKind};
pub use eval::values::{
    BasicExpressionHost, ExpressionHost, ExpressionScope, KeyframeValueBuilder, ValueBuilder,
    ValueRequest,
};
pub use eval::vanity::{Vanity, VanityRegistry};
pub use foundation::core::{Affine, Axis, ElementKey, InstanceId, NodeIdx, Size, Vec2, Vec3};
pub use foundation::error::{MarionetteError, MarionetteResult};
pub use layout::sizing::{Fit, Sizing, fit};
pub use layout::solver::{LayoutCache, compute_node, solve_layout};
pub use layout::spec::{ComputedLayout, LayoutSpec, Matrix4, SizeMode};
pub use scene::cache::SelectorCache;
pub use scene::element::{
    CLASS_ATTRIBUTE, Element, ElementArena, ElementKind, ID_ATTRIBUTE, STYLE_ATTRIBUTE,
};
pub use scene::flatten::{FlatTree, flatten};
pub use scene::model::{
    Document, DocumentDef, ElementDef, HandlerDef, MetadataDef, NodeDef, StateDef,
};
pub use scene::selector::Selector;
pub use session::config::{Config, InteractionMode, RenderOptions};
pub use session::events::{EventLog, EventSink, RuntimeEvent};
pub use session::instance::Instance;
pub use session::methods::{Method, MethodTable};
pub use session::output::{Patch, RenderedChild, RenderedNode, RenderedTree};
pub use session::registry::InstanceRegistry;
pub use session::runtime::{Migration, Runtime, RuntimeBuilder};
pub use session::states::{StateStore, StateTransition, StateTransitions};
