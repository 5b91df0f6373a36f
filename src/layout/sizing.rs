use crate::foundation::core::{Size, Vec2};
use serde::{Deserialize, Serialize};

/// Auto-sizing preset applied to the root element of a top-level instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sizing {
    /// Scale fixed at 1, no centering.
    #[default]
    Normal,
    /// Scale each axis independently to the container's size.
    Stretch,
    /// Uniform scale so the element fits inside the container, centered.
    Contain,
    /// Uniform scale so the element covers the container, centered and cropped.
    Cover,
}

impl Sizing {
    /// Parse a preset keyword.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "stretch" => Some(Self::Stretch),
            "contain" => Some(Self::Contain),
            "cover" => Some(Self::Cover),
            _ => None,
        }
    }
}

/// Scale and centering offset produced by a preset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit {
    /// Per-axis scale.
    pub scale: Vec2,
    /// Translation added to the element.
    pub offset: Vec2,
}

impl Fit {
    const IDENTITY: Self = Self {
        scale: Vec2::new(1.0, 1.0),
        offset: Vec2::ZERO,
    };
}

/// Fit an element of natural size `element` into `container`.
pub fn fit(sizing: Sizing, container: Size, element: Size) -> Fit {
    if element.width <= 0.0 || element.height <= 0.0 {
        return Fit::IDENTITY;
    }
    let sx = container.width / element.width;
    let sy = container.height / element.height;
    let uniform = match sizing {
        Sizing::Normal => return Fit::IDENTITY,
        Sizing::Stretch => {
            return Fit {
                scale: Vec2::new(sx, sy),
                offset: Vec2::ZERO,
            };
        }
        Sizing::Contain => contain_scale(container, element, sx, sy),
        Sizing::Cover => cover_scale(container, element, sx, sy),
    };
    Fit {
        scale: Vec2::new(uniform, uniform),
        offset: Vec2::new(
            (container.width - element.width * uniform) / 2.0,
            (container.height - element.height * uniform) / 2.0,
        ),
    }
}

// Scaled dimensions are truncated toward zero before comparison.
fn scaled(element: Size, s: f64) -> (f64, f64) {
    ((element.width * s).trunc(), (element.height * s).trunc())
}

fn contain_scale(container: Size, element: Size, sx: f64, sy: f64) -> f64 {
    let fits = |s: f64| {
        let (w, h) = scaled(element, s);
        w <= container.width && h <= container.height
    };
    match (fits(sx), fits(sy)) {
        (true, true) => sx.max(sy),
        (true, false) => sx,
        (false, true) => sy,
        (false, false) => sx.min(sy),
    }
}

fn cover_scale(container: Size, element: Size, sx: f64, sy: f64) -> f64 {
    let covers = |s: f64| {
        let (w, h) = scaled(element, s);
        w >= container.width && h >= container.height
    };
    match (covers(sx), covers(sy)) {
        (true, true) => sx.min(sy),
        (true, false) => sx,
        (false, true) => sy,
        (false, false) => sx.max(sy),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/sizing.rs"]
mod tests;
