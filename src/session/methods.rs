use crate::session::runtime::Runtime;
use serde_json::Value;
use std::collections::HashMap;

/// Host callable bound under a method name; receives the runtime and the event payload.
pub type Method = Box<dyn FnMut(&mut Runtime, &Value) -> anyhow::Result<()>>;

/// Method name → bound callable, looked up by name when an event handler fires.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, Method>,
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("MethodTable").field("methods", &names).finish()
    }
}

impl MethodTable {
    /// Bind (or rebind) `name`.
    pub fn bind(&mut self, name: impl Into<String>, method: Method) {
        self.methods.insert(name.into(), method);
    }

    /// Return `true` if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Number of bound methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Return `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<Method> {
        self.methods.remove(name)
    }

    /// Put a taken method back unless it was rebound while running.
    pub(crate) fn restore(&mut self, name: &str, method: Method) {
        self.methods.entry(name.to_owned()).or_insert(method);
    }
}
