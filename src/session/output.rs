use crate::foundation::core::ElementKey;
use crate::layout::spec::ComputedLayout;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One element as handed to a renderer backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNode {
    /// Element identity.
    pub key: ElementKey,
    /// Tag name; component wrappers render as `div`.
    pub name: String,
    /// Attributes, including the nested style map.
    pub attributes: BTreeMap<String, Value>,
    /// Computed geometry, absent for elements without a layout spec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<ComputedLayout>,
    /// Rendered children.
    pub children: Vec<RenderedChild>,
}

/// Child of a [`RenderedNode`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RenderedChild {
    /// Text content.
    Text(String),
    /// Element.
    Node(RenderedNode),
}

impl RenderedNode {
    /// Element children, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &RenderedNode> {
        self.children.iter().filter_map(|c| match c {
            RenderedChild::Node(n) => Some(n),
            RenderedChild::Text(_) => None,
        })
    }

    /// Concatenated text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                RenderedChild::Text(t) => Some(t.as_str()),
                RenderedChild::Node(_) => None,
            })
            .collect()
    }

    /// Depth-first search for `key` in this subtree.
    pub fn find(&self, key: ElementKey) -> Option<&RenderedNode> {
        if self.key == key {
            return Some(self);
        }
        self.elements().find_map(|c| c.find(key))
    }

    /// Depth-first search for the first node whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&RenderedNode> {
        if self.attributes.get("id").and_then(Value::as_str) == Some(id) {
            return Some(self);
        }
        self.elements().find_map(|c| c.find_by_id(id))
    }
}

/// Output of a full render.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedTree {
    /// Document root.
    pub root: RenderedNode,
}

impl RenderedTree {
    /// JSON form.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Stable FNV-1a hash of the serialized tree; equal trees hash equally.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fingerprint::default();
        if let Err(e) = serde_json::to_writer(&mut h, self) {
            tracing::warn!(error = %e, "fingerprint serialization failed");
        }
        h.0
    }
}

/// FNV-1a (64-bit) sink; serialized output is hashed as it is written.
struct Fingerprint(u64);

impl Fingerprint {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self(Self::OFFSET_BASIS)
    }
}

impl std::io::Write for Fingerprint {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &b in buf {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Output of a patch render: every element whose output changed, keyed by identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    /// Changed elements, rendered as they are now.
    pub changed: BTreeMap<ElementKey, RenderedNode>,
}

impl Patch {
    /// Return `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// Number of changed elements.
    pub fn len(&self) -> usize {
        self.changed.len()
    }

    /// Changed keys, ascending.
    pub fn keys(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.changed.keys().copied()
    }

    /// JSON object keyed by the display form of each [`ElementKey`] (`"i0:3"`).
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.changed
                .iter()
                .map(|(k, n)| {
                    (
                        k.to_string(),
                        serde_json::to_value(n).unwrap_or(Value::Null),
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/output.rs"]
mod tests;
