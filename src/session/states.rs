use crate::animation::ease::Ease;
use crate::scene::model::StateDef;
use serde_json::Value;
use std::collections::BTreeMap;

/// Public state surface of one instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateStore {
    values: BTreeMap<String, Value>,
    initial: BTreeMap<String, Value>,
    dirty: bool,
}

impl StateStore {
    /// Seed from declarations, then apply `overrides` to declared names.
    ///
    /// Overrides for undeclared names are ignored with a diagnostic.
    pub fn new(decls: &BTreeMap<String, StateDef>, overrides: &BTreeMap<String, Value>) -> Self {
        let mut values: BTreeMap<String, Value> = decls
            .iter()
            .map(|(k, d)| (k.clone(), d.value.clone()))
            .collect();
        for (k, v) in overrides {
            match values.get_mut(k) {
                Some(slot) => *slot = v.clone(),
                None => tracing::warn!(state = %k, "override for undeclared state ignored"),
            }
        }
        Self {
            initial: values.clone(),
            values,
            dirty: false,
        }
    }

    /// Return `true` if `name` is a declared state.
    pub fn declares(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// All current values.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Declared initial values (after overrides).
    pub fn initial(&self) -> &BTreeMap<String, Value> {
        &self.initial
    }

    /// Write `name`. Returns `true` if the stored value changed.
    ///
    /// Writing an undeclared name declares it.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if self.values.get(name) == Some(&value) {
            return false;
        }
        self.values.insert(name.to_owned(), value);
        self.dirty = true;
        true
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// Tween parameters for a batch state write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateTransition {
    /// Duration in milliseconds.
    pub duration_ms: f64,
    /// Curve over the duration.
    pub curve: Ease,
}

#[derive(Clone, Debug, PartialEq)]
struct Tween {
    from: f64,
    to: f64,
    start_ms: f64,
    transition: StateTransition,
}

/// Minimal tween scheduler for numeric states, driven by the shared clock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateTransitions {
    active: BTreeMap<String, Tween>,
}

impl StateTransitions {
    /// Schedule `targets` from the current values in `store`, starting at `now_ms`.
    ///
    /// Returns the writes to apply immediately: non-numeric targets, and everything when the
    /// transition is instantaneous.
    pub fn schedule(
        &mut self,
        store: &StateStore,
        targets: &BTreeMap<String, Value>,
        transition: StateTransition,
        now_ms: f64,
    ) -> Vec<(String, Value)> {
        let mut immediate = Vec::new();
        for (name, to) in targets {
            let from = store.get(name).and_then(Value::as_f64);
            match (from, to.as_f64()) {
                (Some(from), Some(to)) if transition.duration_ms > 0.0 => {
                    self.active.insert(
                        name.clone(),
                        Tween {
                            from,
                            to,
                            start_ms: now_ms,
                            transition,
                        },
                    );
                }
                _ => {
                    self.active.remove(name);
                    immediate.push((name.clone(), to.clone()));
                }
            }
        }
        immediate
    }

    /// Interpolated writes at `now_ms`; finished tweens are dropped after their final write.
    pub fn tick(&mut self, now_ms: f64) -> Vec<(String, Value)> {
        let mut out = Vec::with_capacity(self.active.len());
        self.active.retain(|name, tw| {
            let t = ((now_ms - tw.start_ms) / tw.transition.duration_ms).clamp(0.0, 1.0);
            let eased = tw.transition.curve.apply(t);
            out.push((name.clone(), Value::from(tw.from + (tw.to - tw.from) * eased)));
            t < 1.0
        });
        out
    }

    /// Return `true` while any tween is running.
    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/states.rs"]
mod tests;
