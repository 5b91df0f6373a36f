pub use kurbo::{Affine, Size, Vec2};

/// Three-component vector used for layout translation, rotation, scale, and size.
pub use glam::DVec3 as Vec3;

/// Identifier of one runtime instance (root or guest).
///
/// Unique within an [`crate::InstanceRegistry`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct InstanceId(pub u32);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Slot index of an element inside one instance's element arena.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// Globally unambiguous element identity: the owning instance plus the arena slot.
///
/// Delta maps produced by patch renders are keyed by this type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ElementKey {
    /// Instance owning the element.
    pub instance: InstanceId,
    /// Arena slot inside that instance.
    pub node: NodeIdx,
}

impl std::fmt::Display for ElementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.instance, self.node.0)
    }
}

/// Spatial axis used by per-axis layout properties (`translation.x`, `scale.z`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
    /// Depth.
    Z,
}

impl Axis {
    /// Component index into a [`Vec3`] (`v[axis.index()]`).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Parse a property suffix (`"x"`, `"y"`, `"z"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }
}

/// Approximate float equality used when deciding whether computed geometry changed.
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
