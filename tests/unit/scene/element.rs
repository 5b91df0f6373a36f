use super::*;
use serde_json::json;

fn arena(v: Value) -> ElementArena {
    let def: ElementDef = serde_json::from_value(v).unwrap();
    ElementArena::from_def(&def)
}

fn sample() -> ElementArena {
    arena(json!({
        "elementName": "div",
        "attributes": { "id": "root" },
        "children": [
            { "elementName": "span", "attributes": { "id": "a" }, "children": ["text"] },
            { "elementName": "defs" },
            { "elementName": { "template": { "elementName": "g" } }, "attributes": { "id": "c" } },
            { "elementName": 42 }
        ]
    }))
}

#[test]
fn builds_parent_links_and_kinds() {
    let a = sample();
    let root = a.get(a.root()).unwrap();
    assert_eq!(root.tag(), Some("div"));
    assert!(root.parent.is_none());
    assert_eq!(root.children.len(), 4);
    for &c in &root.children {
        assert_eq!(a.get(c).unwrap().parent, Some(a.root()));
    }
    assert!(matches!(
        a.get(root.children[2]).unwrap().kind,
        ElementKind::Component { guest: None, failed: false, .. }
    ));
    assert!(matches!(
        a.get(root.children[3]).unwrap().kind,
        ElementKind::Unknown(_)
    ));
}

#[test]
fn layout_specs_only_on_drawing_elements() {
    let a = sample();
    let root = a.get(a.root()).unwrap();
    assert!(root.layout.is_some());
    let span = a.get(root.children[0]).unwrap();
    assert!(a.get(span.children[0]).unwrap().layout.is_none());
    assert!(a.get(root.children[1]).unwrap().layout.is_none());
    assert!(a.get(root.children[2]).unwrap().layout.is_some());
}

#[test]
fn preorder_skips_text_and_unknown_nodes() {
    let a = sample();
    let ids: Vec<Option<String>> = a
        .preorder(a.root())
        .into_iter()
        .map(|i| a.get(i).unwrap().identity())
        .collect();
    assert_eq!(
        ids,
        vec![Some("root".into()), Some("a".into()), None, Some("c".into())]
    );
}

#[test]
fn remove_subtree_frees_slots_and_detaches() {
    let mut a = sample();
    let first = a.get(a.root()).unwrap().children[0];
    let text = a.get(first).unwrap().children[0];
    let cap = a.capacity();
    a.remove_subtree(first);
    assert!(!a.contains(first));
    assert!(!a.contains(text));
    assert_eq!(a.get(a.root()).unwrap().children.len(), 3);
    assert_eq!(a.capacity(), cap);
}

#[test]
fn replace_children_never_reuses_slots() {
    let mut a = sample();
    let first = a.get(a.root()).unwrap().children[0];
    let before = a.capacity();
    a.replace_children(first, &[NodeDef::Text("new".into())]);
    let kids = &a.get(first).unwrap().children;
    assert_eq!(kids.len(), 1);
    assert!(kids[0].slot() >= before);
}

#[test]
fn style_and_attribute_writes_report_changes() {
    let mut a = sample();
    let root = a.root();
    assert!(a.set_style(root, "color", json!("red")));
    assert!(!a.set_style(root, "color", json!("red")));
    assert_eq!(a.get(root).unwrap().attributes["style"], json!({ "color": "red" }));
    assert!(a.set_attribute(root, "title", json!("x")));
    assert!(!a.set_attribute(root, "title", json!("x")));
}

#[test]
fn snapshot_reflects_mutations() {
    let mut a = sample();
    let root = a.root();
    a.set_attribute(root, "data-x", json!(1));
    let NodeDef::Element(e) = a.snapshot(root).unwrap() else {
        panic!("root is an element");
    };
    assert_eq!(e.attributes["data-x"], json!(1));
    assert_eq!(e.children.len(), 4);
}
