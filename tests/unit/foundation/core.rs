use super::*;

#[test]
fn axes_index_vector_components() {
    let mut v = Vec3::ZERO;
    v[Axis::X.index()] = 1.5;
    v[Axis::Z.index()] = -2.0;
    assert_eq!(v, Vec3::new(1.5, 0.0, -2.0));
    assert_eq!(v[Axis::Y.index()], 0.0);
}

#[test]
fn axis_parse_rejects_unknown_suffix() {
    assert_eq!(Axis::parse("y"), Some(Axis::Y));
    assert_eq!(Axis::parse("w"), None);
}

#[test]
fn element_key_display_is_compact() {
    let k = ElementKey {
        instance: InstanceId(3),
        node: NodeIdx(7),
    };
    assert_eq!(k.to_string(), "i3:7");
}
