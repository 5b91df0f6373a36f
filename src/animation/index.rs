use crate::animation::keyframes::{
    Keyframes, PropertyGroup, TimelineDescriptor, TimelineDescriptors,
};
use crate::eval::property::PropertyKind;
use std::rc::Rc;

/// Subset of a document's timelines containing only properties an author could be live-editing.
///
/// Patch renders consult only this subset. It is derived data: rebuilt in full whenever the
/// document's timelines are replaced.
#[derive(Clone, Debug, Default)]
pub struct MutableTimelineIndex {
    descriptors: Rc<TimelineDescriptors>,
}

impl MutableTimelineIndex {
    /// Build the index from a full set of descriptors.
    pub fn build(all: &TimelineDescriptors) -> Self {
        let mut out = TimelineDescriptors::new();
        for (timeline, descriptor) in all {
            let mut kept = TimelineDescriptor::new();
            for (selector, group) in descriptor {
                let mutable: PropertyGroup = group
                    .iter()
                    .filter(|(name, k)| is_mutable_property(name, k))
                    .map(|(name, k)| (name.clone(), k.clone()))
                    .collect();
                if !mutable.is_empty() {
                    kept.insert(selector.clone(), mutable);
                }
            }
            if !kept.is_empty() {
                out.insert(timeline.clone(), kept);
            }
        }
        Self {
            descriptors: Rc::new(out),
        }
    }

    /// Shared handle to the indexed descriptors.
    pub fn descriptors(&self) -> Rc<TimelineDescriptors> {
        Rc::clone(&self.descriptors)
    }

    /// Return `true` if `selector`/`property` on `timeline` is indexed.
    pub fn contains(&self, timeline: &str, selector: &str, property: &str) -> bool {
        self.descriptors
            .get(timeline)
            .and_then(|d| d.get(selector))
            .is_some_and(|g| g.contains_key(property))
    }
}

/// A property is mutable when its value can differ between frames or was edited live.
///
/// Single literal keyframes are baked: they are applied by full renders and never patched.
pub fn is_mutable_property(name: &str, keyframes: &Keyframes) -> bool {
    keyframes.len() > 1
        || keyframes.has_expression()
        || keyframes.has_edited()
        || PropertyKind::parse(name).is_always_mutable()
}
