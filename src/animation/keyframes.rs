use crate::animation::ease::Ease;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Property name → keyframes, for one selector within one timeline.
pub type PropertyGroup = BTreeMap<String, Keyframes>;
/// Selector → property group, for one timeline.
pub type TimelineDescriptor = BTreeMap<String, PropertyGroup>;
/// Timeline name → descriptor, for one document.
pub type TimelineDescriptors = BTreeMap<String, TimelineDescriptor>;

/// Value stored at one keyframe.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyframeValue {
    /// Plain JSON value.
    Literal(Value),
    /// Value-producing expression (JSON strings beginning with `=`), source without the marker.
    Expression(String),
}

impl KeyframeValue {
    /// Classify a raw JSON value.
    pub fn from_json(v: Value) -> Self {
        match v {
            Value::String(s) if s.starts_with('=') => Self::Expression(s[1..].trim().to_owned()),
            other => Self::Literal(other),
        }
    }

    /// JSON form, with the expression marker restored.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Expression(src) => Value::String(format!("={src}")),
        }
    }

    /// Return `true` for expression values.
    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }
}

/// One keyframe: value, optional easing toward the next keyframe, author-edit flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    /// Value at this offset.
    pub value: KeyframeValue,
    /// Curve used when interpolating from this keyframe to the next.
    pub curve: Option<Ease>,
    /// Set when an author edited this keyframe live.
    pub edited: bool,
}

#[derive(Serialize, Deserialize)]
struct KeyframeRepr {
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    curve: Option<Ease>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    edited: bool,
}

/// Keyframe map for one property: millisecond offset → keyframe.
///
/// Offsets are unique and kept sorted ascending regardless of the order they were declared in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keyframes {
    keys: Vec<(u64, Keyframe)>,
}

/// Keyframes surrounding a query time.
#[derive(Clone, Copy, Debug)]
pub struct Bracket<'a> {
    /// Nearest keyframe at or before the query time.
    pub before: Option<(u64, &'a Keyframe)>,
    /// Nearest keyframe at or after the query time.
    pub after: Option<(u64, &'a Keyframe)>,
}

impl Keyframes {
    /// Build from `(offset, keyframe)` pairs. Later duplicates of an offset replace earlier ones.
    pub fn new(keys: impl IntoIterator<Item = (u64, Keyframe)>) -> Self {
        let mut by_ms = BTreeMap::new();
        for (ms, k) in keys {
            by_ms.insert(ms, k);
        }
        Self {
            keys: by_ms.into_iter().collect(),
        }
    }

    /// Single literal keyframe at offset 0.
    pub fn constant(value: Value) -> Self {
        Self::new([(
            0,
            Keyframe {
                value: KeyframeValue::from_json(value),
                curve: None,
                edited: false,
            },
        )])
    }

    /// Sorted `(offset, keyframe)` pairs.
    pub fn keys(&self) -> &[(u64, Keyframe)] {
        &self.keys
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Return `true` when no keyframes are declared.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Largest declared offset, `0` when empty.
    pub fn max_offset(&self) -> u64 {
        self.keys.last().map(|(ms, _)| *ms).unwrap_or(0)
    }

    /// Return `true` when any keyframe holds an expression.
    pub fn has_expression(&self) -> bool {
        self.keys.iter().any(|(_, k)| k.value.is_expression())
    }

    /// Return `true` when any keyframe carries the author-edit flag.
    pub fn has_edited(&self) -> bool {
        self.keys.iter().any(|(_, k)| k.edited)
    }

    /// Linear scan for the keyframes at-or-before and at-or-after `time_ms` (rounded to whole ms).
    pub fn bracket(&self, time_ms: f64) -> Bracket<'_> {
        let t = time_ms.round().max(0.0) as u64;
        let mut before = None;
        let mut after = None;
        for (ms, k) in &self.keys {
            if *ms <= t {
                before = Some((*ms, k));
            }
            if *ms >= t {
                after = Some((*ms, k));
                break;
            }
        }
        Bracket { before, after }
    }

    /// Whether the active interval at `time_ms` depends on an expression.
    ///
    /// An empty map never needs evaluation.
    pub fn is_time_dependent_at(&self, time_ms: f64) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        let b = self.bracket(time_ms);
        b.before.is_some_and(|(_, k)| k.value.is_expression())
            || b.after.is_some_and(|(_, k)| k.value.is_expression())
    }
}

/// Whether any property in `group` needs re-evaluation at `time_ms` because of an expression.
pub fn group_needs_expression_eval(group: &PropertyGroup, time_ms: f64) -> bool {
    group.values().any(|k| k.is_time_dependent_at(time_ms))
}

/// Largest keyframe offset across a whole timeline descriptor.
pub fn descriptor_max_time(descriptor: &TimelineDescriptor) -> u64 {
    descriptor
        .values()
        .flat_map(|g| g.values())
        .map(Keyframes::max_offset)
        .max()
        .unwrap_or(0)
}

impl Serialize for Keyframes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let map: BTreeMap<String, KeyframeRepr> = self
            .keys
            .iter()
            .map(|(ms, k)| {
                (
                    ms.to_string(),
                    KeyframeRepr {
                        value: k.value.to_json(),
                        curve: k.curve,
                        edited: k.edited,
                    },
                )
            })
            .collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Keyframes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, KeyframeRepr>::deserialize(deserializer)?;
        let mut by_ms = BTreeMap::new();
        for (offset, repr) in raw {
            let ms: u64 = offset.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("keyframe offset \"{offset}\" is not a whole ms"))
            })?;
            let k = Keyframe {
                value: KeyframeValue::from_json(repr.value),
                curve: repr.curve,
                edited: repr.edited,
            };
            if by_ms.insert(ms, k).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate keyframe offset {ms}"
                )));
            }
        }
        Ok(Self {
            keys: by_ms.into_iter().collect(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;
