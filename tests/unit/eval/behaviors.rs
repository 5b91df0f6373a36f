use super::*;
use crate::animation::timeline::DEFAULT_TIMELINE;
use crate::foundation::core::NodeIdx;
use crate::scene::element::ElementKind;
use crate::test_support::{Harness, doc};
use serde_json::{Value, json};

fn template() -> Value {
    json!({
        "elementName": "ul",
        "children": [
            { "elementName": "li", "attributes": { "id": "a" } },
            { "elementName": "p", "attributes": { "id": "note" } }
        ]
    })
}

fn opacity(inst: &Instance, idx: NodeIdx) -> f64 {
    inst.arena.get(idx).unwrap().layout.as_ref().unwrap().opacity
}

fn start(h: &mut Harness, at_ms: f64) {
    let tl = h.inst.timelines.get_mut(DEFAULT_TIMELINE).unwrap();
    tl.play();
    tl.advance(0.0);
    tl.advance(at_ms);
}

#[test]
fn forced_pass_applies_every_group() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#a": { "opacity": { "0": { "value": 0.2 } } } } }),
    ));
    let a = h.by_id("a");
    let (inst, mut ctx) = h.split(0.0);
    ctx.force = true;
    apply_behaviors(inst, &mut ctx, None);
    assert_eq!(opacity(inst, a), 0.2);
}

#[test]
fn stopped_timelines_are_skipped_unless_forced() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#a": { "opacity": { "0": { "value": 0.2 } } } } }),
    ));
    let a = h.by_id("a");
    let (inst, mut ctx) = h.split(0.0);
    apply_behaviors(inst, &mut ctx, None);
    assert_eq!(opacity(inst, a), 1.0);
}

#[test]
fn playing_timelines_interpolate_at_their_cursor() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#a": { "opacity": {
            "0": { "value": 0, "curve": "linear" },
            "1000": { "value": 1 }
        } } } }),
    ));
    let a = h.by_id("a");
    start(&mut h, 500.0);
    let (inst, mut ctx) = h.split(500.0);
    apply_behaviors(inst, &mut ctx, None);
    assert!((opacity(inst, a) - 0.5).abs() < 1e-9);
}

#[test]
fn expression_groups_evaluate_while_stopped() {
    let mut h = Harness::new(json!({
        "template": template(),
        "timelines": { "Default": { "#note": { "content": { "0": { "value": "=state.label" } } } } },
        "states": { "label": { "value": "hello" } }
    }));
    let note = h.by_id("note");
    let (inst, mut ctx) = h.split(0.0);
    apply_behaviors(inst, &mut ctx, None);
    let text = inst.arena.get(note).unwrap().children[0];
    assert!(matches!(&inst.arena.get(text).unwrap().kind, ElementKind::Text(s) if s == "hello"));
}

#[test]
fn structural_properties_land_before_presentational_ones() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "li": {
            "opacity": { "0": { "value": 0.5 } },
            "controlFlow.repeat": { "0": { "value": 3 } }
        } } }),
    ));
    let (inst, mut ctx) = h.split(0.0);
    ctx.force = true;
    apply_behaviors(inst, &mut ctx, None);

    let items: Vec<NodeIdx> = inst
        .flat
        .nodes()
        .iter()
        .copied()
        .filter(|&i| inst.arena.get(i).unwrap().tag() == Some("li"))
        .collect();
    assert_eq!(items.len(), 3);
    for i in items {
        assert_eq!(opacity(inst, i), 0.5);
    }
}

#[test]
fn patch_pass_reads_only_the_mutable_index() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#a": {
            "fill": { "0": { "value": "red" } },
            "opacity": { "0": { "value": 0, "curve": "linear" }, "1000": { "value": 1 } }
        } } }),
    ));
    let a = h.by_id("a");
    start(&mut h, 250.0);
    let (inst, mut ctx) = h.split(250.0);
    ctx.patch = true;

    let mut delta = BTreeSet::new();
    apply_behaviors(inst, &mut ctx, Some(&mut delta));
    let key = ElementKey {
        instance: inst.id,
        node: a,
    };
    assert_eq!(delta, BTreeSet::from([key]));
    assert!(!inst.arena.get(a).unwrap().attributes.contains_key("fill"));

    let mut again = BTreeSet::new();
    apply_behaviors(inst, &mut ctx, Some(&mut again));
    assert!(again.is_empty(), "unchanged values are not reported");
}

#[test]
fn repeat_reports_the_parent_in_the_delta() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#a": {
            "controlFlow.repeat": { "0": { "value": 1 }, "1000": { "value": 2 } }
        } } }),
    ));
    let a = h.by_id("a");
    start(&mut h, 0.0);
    let (inst, mut ctx) = h.split(0.0);
    ctx.patch = true;
    let mut delta = BTreeSet::new();
    apply_behaviors(inst, &mut ctx, Some(&mut delta));
    let root = inst.arena.root();
    assert!(delta.contains(&ElementKey {
        instance: inst.id,
        node: a
    }));
    assert!(delta.contains(&ElementKey {
        instance: inst.id,
        node: root
    }));
}

#[test]
fn revealed_elements_receive_the_same_tick_values() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#note": {
            "alt": { "0": { "value": "hidden" }, "500": { "value": "shown" } },
            "controlFlow.if": { "0": { "value": false }, "500": { "value": true } },
            "opacity": { "0": { "value": 0.2 }, "500": { "value": 0.7 } }
        } } }),
    ));
    let note = h.by_id("note");
    start(&mut h, 0.0);
    {
        let (inst, mut ctx) = h.split(0.0);
        ctx.force = true;
        apply_behaviors(inst, &mut ctx, None);
        assert!(!inst.arena.get(note).unwrap().is_present());
        assert!(inst.flat.nodes().contains(&note));
    }

    h.inst.timelines.get_mut(DEFAULT_TIMELINE).unwrap().advance(500.0);
    let (inst, mut ctx) = h.split(500.0);
    apply_behaviors(inst, &mut ctx, None);
    let e = inst.arena.get(note).unwrap();
    assert!(e.is_present());
    assert_eq!(opacity(inst, note), 0.7);
    assert_eq!(e.attributes["alt"], json!("shown"));
}

#[test]
fn hiding_reports_the_parent_in_the_delta() {
    let mut h = Harness::new(doc(
        template(),
        json!({ "Default": { "#note": {
            "controlFlow.if": { "0": { "value": true }, "500": { "value": false } }
        } } }),
    ));
    let note = h.by_id("note");
    start(&mut h, 0.0);
    {
        let (inst, mut ctx) = h.split(0.0);
        ctx.force = true;
        apply_behaviors(inst, &mut ctx, None);
    }

    h.inst.timelines.get_mut(DEFAULT_TIMELINE).unwrap().advance(500.0);
    let (inst, mut ctx) = h.split(500.0);
    ctx.patch = true;
    let mut delta = BTreeSet::new();
    apply_behaviors(inst, &mut ctx, Some(&mut delta));
    let key = |node| ElementKey {
        instance: inst.id,
        node,
    };
    assert!(!inst.arena.get(note).unwrap().is_present());
    assert_eq!(delta, BTreeSet::from([key(note), key(inst.arena.root())]));
}
