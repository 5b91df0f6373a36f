use crate::eval::property::{LayoutField, PropertyKind};
use crate::foundation::core::Axis;
use std::collections::HashMap;

/// Special-cased property handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vanity {
    /// Write one axis of a layout vector field (or a size mode).
    Layout(LayoutField, Axis),
    /// Write layout opacity.
    Opacity,
    /// Write layout opacity and mirror it into the `opacity` attribute.
    OpacityAttribute,
    /// Write layout visibility.
    Shown,
    /// Replace all children with one text node.
    Content,
    /// Replace the child list.
    Children,
    /// Drive play/pause/stop/loop of named timelines.
    Playback,
    /// Conditional presence.
    If,
    /// Repeat the element once per item.
    Repeat,
    /// Substitute a surrogate sub-tree.
    Placeholder,
}

/// Shape tags whose opacity is also an attribute.
const SHAPE_TAGS: &[&str] = &[
    "circle", "ellipse", "g", "image", "line", "path", "polygon", "polyline", "rect", "text", "use",
];

/// Two-tier vanity table: element kind first, then the wildcard tier.
#[derive(Clone, Debug)]
pub struct VanityRegistry {
    by_tag: HashMap<String, HashMap<PropertyKind, Vanity>>,
    wildcard: HashMap<PropertyKind, Vanity>,
}

impl Default for VanityRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        for field in [
            LayoutField::Translation,
            LayoutField::Rotation,
            LayoutField::Scale,
            LayoutField::SizeAbsolute,
            LayoutField::SizeProportional,
            LayoutField::SizeDifferential,
            LayoutField::SizeMode,
            LayoutField::Align,
            LayoutField::Mount,
            LayoutField::Origin,
        ] {
            for axis in [Axis::X, Axis::Y, Axis::Z] {
                reg.register(
                    None,
                    PropertyKind::Layout(field, axis),
                    Vanity::Layout(field, axis),
                );
            }
        }
        reg.register(None, PropertyKind::Opacity, Vanity::Opacity);
        reg.register(None, PropertyKind::Shown, Vanity::Shown);
        reg.register(None, PropertyKind::Content, Vanity::Content);
        reg.register(None, PropertyKind::Children, Vanity::Children);
        reg.register(None, PropertyKind::Playback, Vanity::Playback);
        reg.register(None, PropertyKind::ControlFlowIf, Vanity::If);
        reg.register(None, PropertyKind::ControlFlowRepeat, Vanity::Repeat);
        reg.register(None, PropertyKind::ControlFlowPlaceholder, Vanity::Placeholder);
        for tag in SHAPE_TAGS {
            reg.register(Some(tag), PropertyKind::Opacity, Vanity::OpacityAttribute);
        }
        reg
    }
}

impl VanityRegistry {
    /// Registry with no handlers; every property falls through to style/attribute writes.
    pub fn empty() -> Self {
        Self {
            by_tag: HashMap::new(),
            wildcard: HashMap::new(),
        }
    }

    /// Register `vanity` for `property`, on elements with `tag` or (`None`) on any element.
    pub fn register(&mut self, tag: Option<&str>, property: PropertyKind, vanity: Vanity) {
        match tag {
            Some(tag) => {
                self.by_tag
                    .entry(tag.to_owned())
                    .or_default()
                    .insert(property, vanity);
            }
            None => {
                self.wildcard.insert(property, vanity);
            }
        }
    }

    /// Handler for `property` on an element with `tag`, element tier first.
    pub fn lookup(&self, tag: Option<&str>, property: &PropertyKind) -> Option<Vanity> {
        tag.and_then(|t| self.by_tag.get(t))
            .and_then(|m| m.get(property))
            .or_else(|| self.wildcard.get(property))
            .copied()
    }
}
