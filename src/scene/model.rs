use crate::animation::keyframes::TimelineDescriptors;
use crate::animation::timeline::DEFAULT_TIMELINE;
use crate::foundation::error::{MarionetteError, MarionetteResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Boundary (serde) form of one template node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeDef {
    /// Text content.
    Text(String),
    /// Element or component reference.
    Element(ElementDef),
}

/// Boundary form of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDef {
    /// A tag name for primitives, an embedded document for component references.
    pub element_name: Value,
    /// Attribute map; `style` holds a nested map.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<NodeDef>,
}

impl ElementDef {
    /// Primitive element with the given tag and no attributes.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            element_name: Value::String(name.into()),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }
}

/// Declared state with its initial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    /// Initial value.
    pub value: Value,
    /// Optional declared type name (informational).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One event handler binding: the name of a bound method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerDef {
    /// Method invoked when the event fires.
    pub handler: String,
}

impl<'de> Deserialize<'de> for HandlerDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Obj { handler: String },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(handler) | Repr::Obj { handler } => Ok(Self { handler }),
        }
    }
}

/// Provenance metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDef {
    /// Path of the document relative to its project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relpath: Option<String>,
    /// Project name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Organization name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Boundary form of a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDef {
    /// Root template node.
    pub template: ElementDef,
    /// Timeline name → descriptor.
    #[serde(default)]
    pub timelines: TimelineDescriptors,
    /// Declared states.
    #[serde(default)]
    pub states: BTreeMap<String, StateDef>,
    /// Declared method names that hosts may bind.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Selector → event name → handler.
    #[serde(default)]
    pub event_handlers: BTreeMap<String, BTreeMap<String, HandlerDef>>,
    /// Provenance.
    #[serde(default)]
    pub metadata: MetadataDef,
}

/// Animation document: a template plus named timelines.
///
/// This is the JSON-facing representation. A runtime instance takes its own copy at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    def: DocumentDef,
}

impl Document {
    /// Parse and validate a document from a JSON value.
    ///
    /// Missing timelines or template substructure are repaired with a logged diagnostic;
    /// a missing or malformed template is fatal.
    pub fn from_value(mut v: Value) -> MarionetteResult<Self> {
        let Some(obj) = v.as_object_mut() else {
            return Err(MarionetteError::validation("document must be a JSON object"));
        };
        let Some(template) = obj.get("template") else {
            return Err(MarionetteError::validation("document has no template"));
        };
        validate_template_root(template)?;

        let timelines_missing = !obj.get("timelines").is_some_and(Value::is_object);
        if timelines_missing {
            tracing::warn!("document has no timelines; substituting an empty default timeline");
            obj.insert("timelines".to_owned(), Value::Object(Default::default()));
        }

        let mut def: DocumentDef = serde_json::from_value(v)
            .map_err(|e| MarionetteError::validation(format!("parse document JSON: {e}")))?;
        if !def.timelines.contains_key(DEFAULT_TIMELINE) {
            if !timelines_missing {
                tracing::warn!("document lacks a \"{DEFAULT_TIMELINE}\" timeline; adding one");
            }
            def.timelines
                .insert(DEFAULT_TIMELINE.to_owned(), Default::default());
        }
        Ok(Self { def })
    }

    /// Parse a document from a JSON string.
    pub fn from_json(s: &str) -> MarionetteResult<Self> {
        let v: Value = serde_json::from_str(s)
            .map_err(|e| MarionetteError::validation(format!("parse document JSON: {e}")))?;
        Self::from_value(v)
    }

    /// Parse a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MarionetteResult<Self> {
        let v: Value = serde_json::from_reader(r)
            .map_err(|e| MarionetteError::validation(format!("parse document JSON: {e}")))?;
        Self::from_value(v)
    }

    /// Parse a document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MarionetteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MarionetteError::validation(format!("open document JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize back to JSON.
    pub fn to_value(&self) -> MarionetteResult<Value> {
        serde_json::to_value(&self.def).map_err(|e| MarionetteError::serde(e.to_string()))
    }

    /// Boundary definition.
    pub fn def(&self) -> &DocumentDef {
        &self.def
    }

    pub(crate) fn into_def(self) -> DocumentDef {
        self.def
    }
}

fn validate_template_root(template: &Value) -> MarionetteResult<()> {
    let Some(t) = template.as_object() else {
        return Err(MarionetteError::validation("template must be an element object"));
    };
    match t.get("elementName") {
        Some(Value::String(s)) if !s.is_empty() => Ok(()),
        Some(_) => Err(MarionetteError::validation(
            "template root elementName must be a non-empty tag name",
        )),
        None => Err(MarionetteError::validation("template root has no elementName")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
