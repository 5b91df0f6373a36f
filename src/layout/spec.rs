use crate::eval::property::LayoutField;
use crate::foundation::core::{Affine, Axis, Vec3, approx_eq};
use glam::DMat4;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How one axis of an element's size is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizeMode {
    /// `parent * sizeProportional + sizeDifferential`.
    #[default]
    Proportional,
    /// `sizeAbsolute`.
    Absolute,
    /// Numeric `width`/`height` attribute when present, otherwise the parent's size.
    Auto,
}

impl SizeMode {
    /// Parse a keyword (`"proportional"`, `"absolute"`, `"auto"`) or a code (`0`, `1`, `2`).
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => match s.as_str() {
                "proportional" => Some(Self::Proportional),
                "absolute" => Some(Self::Absolute),
                "auto" => Some(Self::Auto),
                _ => None,
            },
            Value::Number(n) => match n.as_f64()? as i64 {
                0 => Some(Self::Proportional),
                1 => Some(Self::Absolute),
                2 => Some(Self::Auto),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Declared layout of one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    /// Offset added after alignment and mounting.
    pub translation: Vec3,
    /// Euler rotation in radians, applied X then Y then Z.
    pub rotation: Vec3,
    /// Scale about the origin.
    pub scale: Vec3,
    /// Per-axis size derivation (x, y, z).
    pub size_mode: [SizeMode; 3],
    /// Size used by [`SizeMode::Absolute`] axes.
    pub size_absolute: Vec3,
    /// Parent-size multiplier used by [`SizeMode::Proportional`] axes.
    pub size_proportional: Vec3,
    /// Offset added to proportional sizes.
    pub size_differential: Vec3,
    /// Anchor inside the parent, as a fraction of the parent's size.
    pub align: Vec3,
    /// Anchor inside this element, as a fraction of its own size, placed on `align`.
    pub mount: Vec3,
    /// Pivot for rotation and scale, as a fraction of this element's size.
    pub origin: Vec3,
    /// Element opacity in `[0, 1]`.
    pub opacity: f64,
    /// Visibility.
    pub shown: bool,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            size_mode: [SizeMode::Proportional; 3],
            size_absolute: Vec3::ZERO,
            size_proportional: Vec3::ONE,
            size_differential: Vec3::ZERO,
            align: Vec3::ZERO,
            mount: Vec3::ZERO,
            origin: Vec3::new(0.5, 0.5, 0.5),
            opacity: 1.0,
            shown: true,
        }
    }
}

impl LayoutSpec {
    fn vec_mut(&mut self, field: LayoutField) -> Option<&mut Vec3> {
        Some(match field {
            LayoutField::Translation => &mut self.translation,
            LayoutField::Rotation => &mut self.rotation,
            LayoutField::Scale => &mut self.scale,
            LayoutField::SizeAbsolute => &mut self.size_absolute,
            LayoutField::SizeProportional => &mut self.size_proportional,
            LayoutField::SizeDifferential => &mut self.size_differential,
            LayoutField::Align => &mut self.align,
            LayoutField::Mount => &mut self.mount,
            LayoutField::Origin => &mut self.origin,
            LayoutField::SizeMode => return None,
        })
    }

    /// Write one numeric axis of a vector field. Returns `true` if the value changed.
    ///
    /// [`LayoutField::SizeMode`] is not numeric; use [`Self::set_size_mode`].
    pub fn set_axis(&mut self, field: LayoutField, axis: Axis, v: f64) -> bool {
        let Some(target) = self.vec_mut(field) else {
            return false;
        };
        let slot = &mut target[axis.index()];
        if approx_eq(*slot, v) {
            return false;
        }
        *slot = v;
        true
    }

    /// Write one axis' size mode. Returns `true` if it changed.
    pub fn set_size_mode(&mut self, axis: Axis, mode: SizeMode) -> bool {
        let slot = &mut self.size_mode[axis.index()];
        if *slot == mode {
            return false;
        }
        *slot = mode;
        true
    }
}

/// 4x4 transform; serialized column-major.
pub type Matrix4 = DMat4;

/// `T(translation) · T(pivot) · Rz · Ry · Rx · S(scale) · T(-pivot)`.
pub(crate) fn compose(translation: Vec3, pivot: Vec3, rotation: Vec3, scale: Vec3) -> Matrix4 {
    DMat4::from_translation(translation + pivot)
        * DMat4::from_rotation_z(rotation.z)
        * DMat4::from_rotation_y(rotation.y)
        * DMat4::from_rotation_x(rotation.x)
        * DMat4::from_scale(scale)
        * DMat4::from_translation(-pivot)
}

/// Final geometry of one element, relative to its parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedLayout {
    /// Resolved size.
    pub size: Vec3,
    /// Effective translation (alignment, mounting, declared offset and preset centering).
    pub translation: Vec3,
    /// Effective scale (declared or preset).
    pub scale: Vec3,
    /// Full transform.
    pub matrix: Matrix4,
    /// Opacity.
    pub opacity: f64,
    /// Visibility.
    pub shown: bool,
}

impl ComputedLayout {
    /// Planar projection of [`Self::matrix`].
    pub fn to_affine(&self) -> Affine {
        let m = self.matrix.to_cols_array();
        Affine::new([m[0], m[1], m[4], m[5], m[12], m[13]])
    }

    /// Return `true` if translation or scale moved beyond float noise.
    pub fn geometry_differs(&self, other: &Self) -> bool {
        let differs = |a: Vec3, b: Vec3| !a.abs_diff_eq(b, 1e-9);
        differs(self.translation, other.translation)
            || differs(self.scale, other.scale)
            || differs(self.size, other.size)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/spec.rs"]
mod tests;
