use super::*;
use crate::test_support::{Harness, doc};
use serde_json::json;

fn list() -> Harness {
    Harness::new(doc(
        json!({
            "elementName": "ul",
            "children": [
                { "elementName": "li", "attributes": { "id": "item", "class": "row" }, "children": ["x"] },
                { "elementName": "li", "attributes": { "id": "tail" } }
            ]
        }),
        json!({ "Default": {} }),
    ))
}

fn children(inst: &Instance, idx: NodeIdx) -> Vec<NodeIdx> {
    inst.arena.get(idx).unwrap().children.clone()
}

#[test]
fn truthiness_follows_json_semantics() {
    assert!(!truthy(&json!(null)));
    assert!(!truthy(&json!(0)));
    assert!(!truthy(&json!("")));
    assert!(truthy(&json!(0.5)));
    assert!(truthy(&json!("no")));
    assert!(truthy(&json!([])));
}

#[test]
fn repeat_inserts_clones_right_after_the_source() {
    let mut h = list();
    let item = h.by_id("item");
    let tail = h.by_id("tail");
    let (inst, mut ctx) = h.split(0.0);
    let root = inst.arena.root();

    let out = apply_repeat(inst, &mut ctx, item, &json!(3));
    assert!(out.changed && out.restructured);
    assert_eq!(out.parent, Some(root));

    let kids = children(inst, root);
    assert_eq!(kids.len(), 4);
    assert_eq!(kids[0], item);
    assert_eq!(kids[3], tail);
    for &c in &kids[1..3] {
        let e = inst.arena.get(c).unwrap();
        assert_eq!(e.memory.repeat_of, Some(item));
        assert_eq!(e.tag(), Some("li"));
        assert_eq!(e.parent, Some(root));
        assert_eq!(e.children.len(), 1);
    }
}

#[test]
fn repeat_is_idempotent_and_shrinks() {
    let mut h = list();
    let item = h.by_id("item");
    let (inst, mut ctx) = h.split(0.0);
    let root = inst.arena.root();

    apply_repeat(inst, &mut ctx, item, &json!(3));
    let clones = children(inst, root)[1..3].to_vec();
    assert_eq!(apply_repeat(inst, &mut ctx, item, &json!(3)), ApplyOutcome::default());

    apply_repeat(inst, &mut ctx, item, &json!(1));
    assert_eq!(children(inst, root).len(), 2);
    for c in clones {
        assert!(!inst.arena.contains(c));
    }
}

#[test]
fn repeat_payloads_merge_into_attributes() {
    let mut h = list();
    let item = h.by_id("item");
    let (inst, mut ctx) = h.split(0.0);
    let root = inst.arena.root();

    apply_repeat(inst, &mut ctx, item, &json!([{ "label": "a" }, { "label": "b" }]));
    let kids = children(inst, root);
    assert_eq!(inst.arena.get(kids[0]).unwrap().attributes["label"], json!("a"));
    let clone = inst.arena.get(kids[1]).unwrap();
    assert_eq!(clone.attributes["label"], json!("b"));
    assert_eq!(clone.attributes["class"], json!("row"));
}

#[test]
fn repeat_zero_hides_the_source_until_items_return() {
    let mut h = list();
    let item = h.by_id("item");
    let (inst, mut ctx) = h.split(0.0);

    apply_repeat(inst, &mut ctx, item, &json!(0));
    let e = inst.arena.get(item).unwrap();
    assert!(!e.is_present());
    assert!(e.is_matchable());

    apply_repeat(inst, &mut ctx, item, &json!(2));
    assert!(inst.arena.get(item).unwrap().is_present());
}

#[test]
fn repeat_on_clones_and_root_is_ignored() {
    let mut h = list();
    let item = h.by_id("item");
    let (inst, mut ctx) = h.split(0.0);
    let root = inst.arena.root();

    apply_repeat(inst, &mut ctx, item, &json!(2));
    let clone = children(inst, root)[1];
    assert_eq!(apply_repeat(inst, &mut ctx, clone, &json!(5)), ApplyOutcome::default());
    assert_eq!(apply_repeat(inst, &mut ctx, root, &json!(2)), ApplyOutcome::default());
    assert_eq!(children(inst, root).len(), 3);
}

#[test]
fn if_toggles_presence_without_removing_the_element() {
    let mut h = list();
    let item = h.by_id("item");
    let (inst, _ctx) = h.split(0.0);

    let parent = inst.arena.get(item).unwrap().parent;
    let hidden = apply_if(inst, item, &json!(false));
    assert!(hidden.changed);
    assert!(parent.is_some());
    assert_eq!(hidden.parent, parent);
    assert!(!inst.arena.get(item).unwrap().is_present());
    assert!(inst.arena.contains(item));
    assert!(!apply_if(inst, item, &json!(0)).changed);
    assert!(apply_if(inst, item, &json!(true)).changed);
    assert!(inst.arena.get(item).unwrap().is_present());
}

#[test]
fn surrogate_lookup_by_index_key_and_selector() {
    let src = PlaceholderSource::new(json!([
        { "elementName": "g", "attributes": { "id": "first" } },
        { "elementName": "g", "children": [{ "elementName": "circle", "attributes": { "class": "dot" } }] }
    ]));
    assert!(matches!(src.lookup(&json!(1)), Some(NodeDef::Element(_))));
    assert_eq!(src.lookup(&json!("0")), src.lookup(&json!(0)));
    let Some(NodeDef::Element(dot)) = src.lookup(&json!(".dot")) else {
        panic!("selector lookup failed");
    };
    assert_eq!(dot.element_name, json!("circle"));
    assert!(src.lookup(&json!(7)).is_none());

    let named = PlaceholderSource::new(json!({ "hero": { "elementName": "img" } }));
    assert!(named.lookup(&json!("hero")).is_some());
    assert!(named.lookup(&json!("villain")).is_none());
}

fn slot() -> Harness {
    Harness::new(doc(
        json!({
            "elementName": "div",
            "children": [{
                "elementName": "div",
                "attributes": { "id": "slot" },
                "children": [{ "elementName": "span" }]
            }]
        }),
        json!({ "Default": {} }),
    ))
}

#[test]
fn placeholder_replaces_tag_attributes_and_children() {
    let mut h = slot();
    h.placeholders.set_surrogates(json!([
        { "elementName": "rect", "attributes": { "fill": "red" }, "children": ["hi"] }
    ]));
    let slot = h.by_id("slot");
    let (inst, mut ctx) = h.split(0.0);
    let old = children(inst, slot);

    let out = apply_placeholder(inst, &mut ctx, slot, &json!(0));
    assert!(out.changed && out.restructured);
    assert!(!inst.arena.contains(old[0]));
    {
        let e = inst.arena.get(slot).unwrap();
        assert_eq!(e.tag(), Some("rect"));
        assert_eq!(e.attributes["fill"], json!("red"));
        assert_eq!(e.attributes["id"], json!("slot"));
        assert_eq!(e.children.len(), 1);
        assert!(matches!(
            &inst.arena.get(e.children[0]).unwrap().kind,
            ElementKind::Text(s) if s == "hi"
        ));
    }
    assert_eq!(
        apply_placeholder(inst, &mut ctx, slot, &json!(0)),
        ApplyOutcome::default()
    );
}

#[test]
fn missing_surrogate_leaves_the_element_alone() {
    let mut h = slot();
    let slot = h.by_id("slot");
    let (inst, mut ctx) = h.split(0.0);
    assert_eq!(
        apply_placeholder(inst, &mut ctx, slot, &json!(3)),
        ApplyOutcome::default()
    );
    assert_eq!(children(inst, slot).len(), 1);
}

struct Caption;

impl PlaceholderHook for Caption {
    fn project(&mut self, key: &Value, _surrogate: &NodeDef) -> Option<NodeDef> {
        Some(NodeDef::Text(format!("projected {key}")))
    }
}

#[test]
fn placeholder_hook_overrides_the_copy() {
    let mut h = slot();
    h.placeholders = PlaceholderSource::new(json!({ "a": "plain" })).with_hook(Box::new(Caption));
    let slot = h.by_id("slot");
    let (inst, mut ctx) = h.split(0.0);
    apply_placeholder(inst, &mut ctx, slot, &json!("a"));
    let kids = children(inst, slot);
    assert_eq!(kids.len(), 1);
    let ElementKind::Text(text) = &inst.arena.get(kids[0]).unwrap().kind else {
        panic!("expected a text child");
    };
    assert!(text.starts_with("projected"));
}
