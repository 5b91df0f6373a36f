use super::*;
use serde_json::json;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn defaults_fill_the_parent_around_the_center() {
    let s = LayoutSpec::default();
    assert_eq!(s.size_mode, [SizeMode::Proportional; 3]);
    assert_eq!(s.size_proportional, Vec3::ONE);
    assert_eq!(s.origin, Vec3::new(0.5, 0.5, 0.5));
    assert!(s.shown);
    assert_eq!(s.opacity, 1.0);
}

#[test]
fn set_axis_reports_changes_only() {
    let mut s = LayoutSpec::default();
    assert!(s.set_axis(LayoutField::Translation, Axis::X, 10.0));
    assert!(!s.set_axis(LayoutField::Translation, Axis::X, 10.0));
    assert!(!s.set_axis(LayoutField::SizeMode, Axis::X, 1.0));
    assert_eq!(s.translation.x, 10.0);
}

#[test]
fn size_mode_accepts_keywords_and_codes() {
    assert_eq!(SizeMode::from_json(&json!("absolute")), Some(SizeMode::Absolute));
    assert_eq!(SizeMode::from_json(&json!(2)), Some(SizeMode::Auto));
    assert_eq!(SizeMode::from_json(&json!("bogus")), None);
    let mut s = LayoutSpec::default();
    assert!(s.set_size_mode(Axis::Y, SizeMode::Absolute));
    assert!(!s.set_size_mode(Axis::Y, SizeMode::Absolute));
}

#[test]
fn rotation_about_z_maps_x_onto_y() {
    let m = compose(
        Vec3::ZERO,
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        Vec3::ONE,
    );
    let x = m.transform_vector3(Vec3::X);
    assert!(close(x.x, 0.0));
    assert!(close(x.y, 1.0));
}

#[test]
fn scale_and_rotation_pivot_on_the_origin() {
    let pivot = Vec3::new(50.0, 50.0, 0.0);
    let m = compose(Vec3::ZERO, pivot, Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0));
    assert!(m.transform_point3(pivot).abs_diff_eq(pivot, 1e-9));
    assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(-50.0, -50.0, 0.0), 1e-9));

    let quarter = Vec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
    let r = compose(Vec3::ZERO, pivot, quarter, Vec3::ONE);
    let moved = r.transform_point3(Vec3::new(100.0, 50.0, 0.0));
    assert!(moved.abs_diff_eq(Vec3::new(50.0, 100.0, 0.0), 1e-9));
}

#[test]
fn affine_projection_keeps_translation_and_scale() {
    let c = ComputedLayout {
        size: Vec3::ZERO,
        translation: Vec3::new(5.0, 7.0, 0.0),
        scale: Vec3::new(2.0, 3.0, 1.0),
        matrix: compose(
            Vec3::new(5.0, 7.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(2.0, 3.0, 1.0),
        ),
        opacity: 1.0,
        shown: true,
    };
    assert_eq!(c.to_affine().as_coeffs(), [2.0, 0.0, 0.0, 3.0, 5.0, 7.0]);
}

#[test]
fn computed_layouts_serialize_glam_shapes() {
    let c = ComputedLayout {
        size: Vec3::new(10.0, 20.0, 0.0),
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
        matrix: Matrix4::IDENTITY,
        opacity: 1.0,
        shown: true,
    };
    let v = serde_json::to_value(&c).unwrap();
    assert_eq!(v["size"], json!([10.0, 20.0, 0.0]));
    assert_eq!(v["matrix"].as_array().map(Vec::len), Some(16));
}
