use super::*;

const CONTAINER: Size = Size::new(200.0, 100.0);
const ELEMENT: Size = Size::new(100.0, 100.0);

#[test]
fn stretch_scales_axes_independently() {
    let f = fit(Sizing::Stretch, CONTAINER, ELEMENT);
    assert_eq!(f.scale, Vec2::new(2.0, 1.0));
    assert_eq!(f.offset, Vec2::ZERO);
}

#[test]
fn contain_letterboxes_and_centers() {
    let f = fit(Sizing::Contain, CONTAINER, ELEMENT);
    assert_eq!(f.scale, Vec2::new(1.0, 1.0));
    assert_eq!(f.offset, Vec2::new(50.0, 0.0));
}

#[test]
fn cover_crops_and_centers() {
    let f = fit(Sizing::Cover, CONTAINER, ELEMENT);
    assert_eq!(f.scale, Vec2::new(2.0, 2.0));
    assert_eq!(f.offset, Vec2::new(0.0, -50.0));
}

#[test]
fn normal_is_identity() {
    let f = fit(Sizing::Normal, CONTAINER, ELEMENT);
    assert_eq!(f.scale, Vec2::new(1.0, 1.0));
    assert_eq!(f.offset, Vec2::ZERO);
}

#[test]
fn truncation_absorbs_float_overshoot() {
    // 7 * (300 / 7) may land a hair above 300 in floating point.
    let f = fit(Sizing::Contain, Size::new(300.0, 1000.0), Size::new(7.0, 7.0));
    assert!((f.scale.x - 300.0 / 7.0).abs() < 1e-12);
}

#[test]
fn zero_sized_element_is_left_alone() {
    let f = fit(Sizing::Cover, CONTAINER, Size::ZERO);
    assert_eq!(f.scale, Vec2::new(1.0, 1.0));
}

#[test]
fn parses_keywords() {
    assert_eq!(Sizing::parse("cover"), Some(Sizing::Cover));
    assert_eq!(Sizing::parse("fill"), None);
}
