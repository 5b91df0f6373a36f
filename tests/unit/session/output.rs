use super::*;
use crate::foundation::core::{InstanceId, NodeIdx};
use std::io::Write;

fn leaf(node: u32, text: &[&str]) -> RenderedNode {
    RenderedNode {
        key: ElementKey {
            instance: InstanceId(0),
            node: NodeIdx(node),
        },
        name: "p".to_owned(),
        attributes: BTreeMap::new(),
        layout: None,
        children: text
            .iter()
            .map(|t| RenderedChild::Text((*t).to_owned()))
            .collect(),
    }
}

fn tree(root: RenderedNode) -> RenderedTree {
    RenderedTree { root }
}

#[test]
fn fingerprint_sink_is_fnv1a() {
    assert_eq!(Fingerprint::default().0, 0xcbf2_9ce4_8422_2325);
    let mut h = Fingerprint::default();
    h.write_all(b"a").unwrap();
    assert_eq!(h.0, 0xaf63_dc4c_8601_ec8c);
}

#[test]
fn chunked_writes_hash_like_one_write() {
    let mut a = Fingerprint::default();
    a.write_all(b"marionette").unwrap();
    let mut b = Fingerprint::default();
    b.write_all(b"mario").unwrap();
    b.write_all(b"nette").unwrap();
    assert_eq!(a.0, b.0);
}

#[test]
fn adjacent_text_children_keep_their_boundaries() {
    let a = tree(leaf(1, &["ab", "c"]));
    let b = tree(leaf(1, &["a", "bc"]));
    assert_eq!(a.root.text(), b.root.text());
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint(), a.clone().fingerprint());
}

#[test]
fn identity_is_part_of_the_fingerprint() {
    assert_ne!(
        tree(leaf(1, &["x"])).fingerprint(),
        tree(leaf(2, &["x"])).fingerprint()
    );
}
