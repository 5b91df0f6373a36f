use crate::animation::keyframes::{KeyframeValue, Keyframes, PropertyGroup};
use crate::foundation::core::ElementKey;
use crate::foundation::error::{MarionetteError, MarionetteResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Everything a value builder needs to produce one property value for one element.
#[derive(Clone, Copy, Debug)]
pub struct ValueRequest<'a> {
    /// Timeline name.
    pub timeline: &'a str,
    /// Timeline-local time in milliseconds.
    pub time_ms: f64,
    /// Target element.
    pub element: ElementKey,
    /// Property name.
    pub property: &'a str,
    /// Keyframes declared for this property.
    pub keyframes: &'a Keyframes,
    /// Whole property group the property belongs to.
    pub group: &'a PropertyGroup,
    /// Set for patch renders.
    pub patch: bool,
    /// Bypass memoized results.
    pub skip_cache: bool,
    /// Public state of the instance owning the element.
    pub states: &'a BTreeMap<String, Value>,
}

/// Produces property values for the behavior engine.
///
/// `None` means "no change to apply".
pub trait ValueBuilder {
    /// Value of `req.property` at `req.time_ms`.
    fn resolve(&mut self, req: &ValueRequest<'_>) -> Option<Value>;

    /// Forget anything memoized. Called when element identities are reassigned, such as after a
    /// document swap.
    fn invalidate(&mut self) {}
}

/// Inputs visible to expression keyframes.
#[derive(Clone, Copy, Debug)]
pub struct ExpressionScope<'a> {
    /// Timeline-local time in milliseconds.
    pub time_ms: f64,
    /// Public state of the owning instance.
    pub states: &'a BTreeMap<String, Value>,
}

/// Evaluates expression keyframes (JSON strings beginning with `=`).
pub trait ExpressionHost {
    /// Evaluate `source` (marker stripped).
    fn evaluate(&self, source: &str, scope: &ExpressionScope<'_>) -> MarionetteResult<Value>;
}

/// Understands `time`, `state.<name>`, numbers, and booleans.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicExpressionHost;

impl ExpressionHost for BasicExpressionHost {
    fn evaluate(&self, source: &str, scope: &ExpressionScope<'_>) -> MarionetteResult<Value> {
        let src = source.trim();
        if src == "time" {
            return Ok(Value::from(scope.time_ms));
        }
        if let Some(name) = src.strip_prefix("state.") {
            return scope
                .states
                .get(name)
                .cloned()
                .ok_or_else(|| MarionetteError::evaluation(format!("unknown state \"{name}\"")));
        }
        match src {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        src.parse::<f64>()
            .map(Value::from)
            .map_err(|_| MarionetteError::evaluation(format!("unsupported expression \"{src}\"")))
    }
}

type MemoKey = (String, u64, ElementKey, String);

const MEMO_LIMIT: usize = 8192;

/// Default [`ValueBuilder`]: hold or eased-linear interpolation between keyframes.
///
/// A keyframe without a curve holds its value until the next keyframe. Numbers and arrays of
/// numbers interpolate; anything else holds. Literal-only results are memoized per
/// (timeline, time, element, property); anything touching an expression is recomputed.
pub struct KeyframeValueBuilder {
    host: Box<dyn ExpressionHost>,
    memo: HashMap<MemoKey, Value>,
}

impl Default for KeyframeValueBuilder {
    fn default() -> Self {
        Self::new(Box::new(BasicExpressionHost))
    }
}

impl std::fmt::Debug for KeyframeValueBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyframeValueBuilder")
            .field("memo", &self.memo.len())
            .finish_non_exhaustive()
    }
}

impl KeyframeValueBuilder {
    /// Builder using a custom expression host.
    pub fn new(host: Box<dyn ExpressionHost>) -> Self {
        Self {
            host,
            memo: HashMap::new(),
        }
    }

    /// Number of memoized values.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    fn value_at(&self, v: &KeyframeValue, scope: &ExpressionScope<'_>) -> Option<Value> {
        match v {
            KeyframeValue::Literal(v) => Some(v.clone()),
            KeyframeValue::Expression(src) => match self.host.evaluate(src, scope) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(expression = %src, error = %e, "expression evaluation failed");
                    None
                }
            },
        }
    }

    fn sample(&self, req: &ValueRequest<'_>) -> Option<Value> {
        let keys = req.keyframes.keys();
        if keys.is_empty() {
            return None;
        }
        let scope = ExpressionScope {
            time_ms: req.time_ms,
            states: req.states,
        };
        let t = req.time_ms.max(0.0);
        let idx = keys.partition_point(|(ms, _)| (*ms as f64) <= t);
        if idx == 0 {
            return self.value_at(&keys[0].1.value, &scope);
        }
        if idx >= keys.len() {
            return self.value_at(&keys[keys.len() - 1].1.value, &scope);
        }
        let (a_ms, a) = &keys[idx - 1];
        let (b_ms, b) = &keys[idx];
        let from = self.value_at(&a.value, &scope)?;
        let Some(curve) = a.curve else {
            return Some(from);
        };
        let denom = b_ms.saturating_sub(*a_ms);
        if denom == 0 {
            return Some(from);
        }
        let to = self.value_at(&b.value, &scope)?;
        let progress = curve.apply((t - *a_ms as f64) / denom as f64);
        Some(lerp_value(&from, &to, progress).unwrap_or(from))
    }
}

fn lerp_value(a: &Value, b: &Value, t: f64) -> Option<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64()?, y.as_f64()?);
            Some(Value::from(x + (y - x) * t))
        }
        (Value::Array(xs), Value::Array(ys)) if xs.len() == ys.len() => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| lerp_value(x, y, t))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}

impl ValueBuilder for KeyframeValueBuilder {
    fn resolve(&mut self, req: &ValueRequest<'_>) -> Option<Value> {
        let cacheable = !req.skip_cache && !req.keyframes.has_expression();
        let key = (
            req.timeline.to_owned(),
            req.time_ms.to_bits(),
            req.element,
            req.property.to_owned(),
        );
        if cacheable {
            if let Some(v) = self.memo.get(&key) {
                return Some(v.clone());
            }
        }
        let v = self.sample(req)?;
        if cacheable {
            if self.memo.len() >= MEMO_LIMIT {
                self.memo.clear();
            }
            self.memo.insert(key, v.clone());
        }
        Some(v)
    }

    fn invalidate(&mut self) {
        self.memo.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/values.rs"]
mod tests;
