use super::*;
use crate::eval::property::LayoutField;
use crate::scene::model::ElementDef;
use serde_json::json;

fn arena() -> ElementArena {
    let def: ElementDef = serde_json::from_value(json!({
        "elementName": "div",
        "children": [
            { "elementName": "div", "children": [{ "elementName": "span" }] },
            { "elementName": "defs", "children": [{ "elementName": "rect" }] }
        ]
    }))
    .unwrap();
    let mut a = ElementArena::from_def(&def);
    let root = a.root();
    let spec = a.get_mut(root).unwrap().layout.as_mut().unwrap();
    spec.size_mode = [SizeMode::Absolute; 3];
    spec.size_absolute = Vec3::new(100.0, 100.0, 0.0);
    a
}

fn child(a: &ElementArena, i: usize) -> NodeIdx {
    a.get(a.root()).unwrap().children[i]
}

#[test]
fn proportional_children_inherit_parent_size() {
    let a = arena();
    let mut cache = LayoutCache::new();
    solve_layout(&a, Vec3::new(200.0, 100.0, 0.0), Sizing::Normal, &BTreeSet::new(), &mut cache);
    let c = &cache[&child(&a, 0)];
    assert_eq!(c.size, Vec3::new(100.0, 100.0, 0.0));
    assert_eq!(cache[&a.root()].scale, Vec3::ONE);
}

#[test]
fn non_drawing_subtrees_are_skipped() {
    let a = arena();
    let mut cache = LayoutCache::new();
    solve_layout(&a, Vec3::new(200.0, 100.0, 0.0), Sizing::Normal, &BTreeSet::new(), &mut cache);
    let defs = child(&a, 1);
    assert!(!cache.contains_key(&defs));
    let rect = a.get(defs).unwrap().children[0];
    assert!(!cache.contains_key(&rect));
}

#[test]
fn cover_preset_applies_to_root_only() {
    let a = arena();
    let mut cache = LayoutCache::new();
    solve_layout(&a, Vec3::new(200.0, 100.0, 0.0), Sizing::Cover, &BTreeSet::new(), &mut cache);
    let root = &cache[&a.root()];
    assert_eq!(root.scale, Vec3::new(2.0, 2.0, 1.0));
    assert_eq!(root.translation, Vec3::new(0.0, -50.0, 0.0));
    assert_eq!(cache[&child(&a, 0)].scale, Vec3::ONE);
}

#[test]
fn align_and_mount_position_against_parent() {
    let mut a = arena();
    let c = child(&a, 0);
    let spec = a.get_mut(c).unwrap().layout.as_mut().unwrap();
    spec.size_proportional = Vec3::new(0.5, 0.5, 1.0);
    spec.align = Vec3::new(1.0, 0.5, 0.0);
    spec.mount = Vec3::new(1.0, 0.5, 0.0);
    let mut cache = LayoutCache::new();
    solve_layout(&a, Vec3::new(100.0, 100.0, 0.0), Sizing::Normal, &BTreeSet::new(), &mut cache);
    assert_eq!(cache[&c].translation, Vec3::new(50.0, 25.0, 0.0));
    assert_eq!(cache[&c].to_affine().translation().x, 50.0);
}

#[test]
fn only_moved_elements_are_reported() {
    let mut a = arena();
    let mut cache = LayoutCache::new();
    let container = Vec3::new(200.0, 100.0, 0.0);
    let first = solve_layout(&a, container, Sizing::Normal, &BTreeSet::new(), &mut cache);
    assert_eq!(first.len(), 3);
    assert!(solve_layout(&a, container, Sizing::Normal, &BTreeSet::new(), &mut cache).is_empty());

    let c = child(&a, 0);
    a.get_mut(c)
        .unwrap()
        .layout
        .as_mut()
        .unwrap()
        .set_axis(LayoutField::Translation, crate::foundation::core::Axis::X, 4.0);
    assert_eq!(
        solve_layout(&a, container, Sizing::Normal, &BTreeSet::new(), &mut cache),
        vec![c]
    );
}

#[test]
fn horizons_stop_descent() {
    let a = arena();
    let c = child(&a, 0);
    let span = a.get(c).unwrap().children[0];
    let mut cache = LayoutCache::new();
    solve_layout(
        &a,
        Vec3::new(200.0, 100.0, 0.0),
        Sizing::Normal,
        &BTreeSet::from([c]),
        &mut cache,
    );
    assert!(cache.contains_key(&c));
    assert!(!cache.contains_key(&span));
}
