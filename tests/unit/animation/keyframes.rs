use super::*;
use serde_json::json;

fn kfs(v: Value) -> Keyframes {
    serde_json::from_value(v).unwrap()
}

#[test]
fn offsets_are_sorted_regardless_of_declaration_order() {
    let k = kfs(json!({
        "1000": { "value": 1 },
        "0": { "value": 0 },
        "500": { "value": 0.5 }
    }));
    let offsets: Vec<u64> = k.keys().iter().map(|(ms, _)| *ms).collect();
    assert_eq!(offsets, vec![0, 500, 1000]);
    assert_eq!(k.max_offset(), 1000);
}

#[test]
fn duplicate_offsets_after_normalization_are_rejected() {
    let r = serde_json::from_value::<Keyframes>(json!({
        "0": { "value": 0 },
        "00": { "value": 1 }
    }));
    assert!(r.is_err());
}

#[test]
fn bracket_finds_neighbours_with_rounding() {
    let k = kfs(json!({ "0": { "value": 0 }, "100": { "value": 1 } }));
    let b = k.bracket(49.6);
    assert_eq!(b.before.map(|(ms, _)| ms), Some(0));
    assert_eq!(b.after.map(|(ms, _)| ms), Some(100));

    let exact = k.bracket(99.7);
    assert_eq!(exact.before.map(|(ms, _)| ms), Some(100));
    assert_eq!(exact.after.map(|(ms, _)| ms), Some(100));

    let past = k.bracket(500.0);
    assert_eq!(past.before.map(|(ms, _)| ms), Some(100));
    assert!(past.after.is_none());
}

#[test]
fn literal_only_group_is_never_time_dependent() {
    let k = kfs(json!({ "0": { "value": 0 }, "100": { "value": 1 } }));
    for t in [0.0, 50.0, 100.0, 1000.0] {
        assert!(!k.is_time_dependent_at(t));
    }
}

#[test]
fn expression_keyframe_is_detected_only_inside_its_interval() {
    let k = kfs(json!({
        "0": { "value": 0 },
        "100": { "value": "=time" },
        "200": { "value": 5 },
        "300": { "value": 6 }
    }));
    assert!(k.is_time_dependent_at(50.0));
    assert!(k.is_time_dependent_at(150.0));
    assert!(!k.is_time_dependent_at(250.0));
}

#[test]
fn empty_map_never_needs_evaluation() {
    assert!(!Keyframes::default().is_time_dependent_at(0.0));
}

#[test]
fn expression_marker_roundtrips_through_json() {
    let k = kfs(json!({
        "0": { "value": "= state.count ", "curve": "easeInQuad", "edited": true }
    }));
    let (_, first) = &k.keys()[0];
    assert_eq!(first.value, KeyframeValue::Expression("state.count".to_owned()));
    assert_eq!(first.curve, Some(Ease::EaseInQuad));
    assert!(first.edited);
    let back = serde_json::to_value(&k).unwrap();
    assert_eq!(back["0"]["value"], json!("=state.count"));
}

#[test]
fn descriptor_max_time_spans_all_groups() {
    let mut g1 = PropertyGroup::new();
    g1.insert("opacity".into(), kfs(json!({ "0": { "value": 0 }, "250": { "value": 1 } })));
    let mut g2 = PropertyGroup::new();
    g2.insert("translation.x".into(), kfs(json!({ "900": { "value": 3 } })));
    let mut d = TimelineDescriptor::new();
    d.insert("#a".into(), g1);
    d.insert("#b".into(), g2);
    assert_eq!(descriptor_max_time(&d), 900);
}
