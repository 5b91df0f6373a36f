use super::*;
use crate::scene::model::ElementDef;
use serde_json::json;

fn arena() -> ElementArena {
    let def: ElementDef = serde_json::from_value(json!({
        "elementName": "svg",
        "attributes": { "id": "root" },
        "children": [
            {
                "elementName": "g",
                "attributes": { "id": "group", "class": "layer main" },
                "children": [
                    { "elementName": "rect", "attributes": { "id": "r1", "data-n": 1 } },
                    {
                        "elementName": "g",
                        "children": [
                            { "elementName": "rect", "attributes": { "id": "r2", "class": "main" } }
                        ]
                    }
                ]
            },
            { "elementName": "rect", "attributes": { "id": "r3", "title": "hello world" } }
        ]
    }))
    .unwrap();
    ElementArena::from_def(&def)
}

fn ids(a: &ElementArena, sel: &str) -> Vec<String> {
    let flat = a.preorder(a.root());
    Selector::parse(sel)
        .unwrap()
        .query(a, &flat)
        .into_iter()
        .filter_map(|i| a.get(i).unwrap().identity())
        .collect()
}

#[test]
fn tag_and_identity() {
    let a = arena();
    assert_eq!(ids(&a, "rect"), vec!["r1", "r2", "r3"]);
    assert_eq!(ids(&a, "#r2"), vec!["r2"]);
    assert_eq!(ids(&a, "rect#r3"), vec!["r3"]);
    assert!(ids(&a, "g#r3").is_empty());
}

#[test]
fn classes_and_attributes() {
    let a = arena();
    assert_eq!(ids(&a, ".main"), vec!["group", "r2"]);
    assert_eq!(ids(&a, "g.layer.main"), vec!["group"]);
    assert_eq!(ids(&a, "[data-n=1]"), vec!["r1"]);
    assert_eq!(ids(&a, "[title=\"hello world\"]"), vec!["r3"]);
    assert_eq!(ids(&a, "[title]"), vec!["r3"]);
}

#[test]
fn descendant_and_child_combinators() {
    let a = arena();
    assert_eq!(ids(&a, "#group rect"), vec!["r1", "r2"]);
    assert_eq!(ids(&a, "#group > rect"), vec!["r1"]);
    assert_eq!(ids(&a, "svg > rect"), vec!["r3"]);
    assert_eq!(ids(&a, "svg g rect.main"), vec!["r2"]);
}

#[test]
fn alternatives_keep_flat_order() {
    let a = arena();
    assert_eq!(ids(&a, "#r3, #r1"), vec!["r1", "r3"]);
    assert_eq!(ids(&a, "*#root"), vec!["root"]);
}

#[test]
fn malformed_selectors_are_errors() {
    for bad in ["", " , #a", "#", "[x", "[x=\"y]", "a >", "rect$"] {
        assert!(
            matches!(Selector::parse(bad), Err(MarionetteError::Selector(_))),
            "expected error for {bad:?}"
        );
    }
}
