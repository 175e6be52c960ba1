//! Canonical data model
//!
//! Every input shape (rich schema or legacy machine) converges on the types
//! in this module. They are handed read-only to the documentation layer,
//! which serializes them into template data.

use crate::state_machine::{FlatState, Transition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level normalized unit extracted from one module export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    pub name: String,

    /// Derived from `name`
    pub slug: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub models: Vec<Model>,

    #[serde(default)]
    pub logic: Vec<LogicUnit>,

    /// `None` when the source declared no components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestration: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Data entity declaration, passed through largely opaque
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Value>,
}

/// One behavioral definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicUnit {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Derived from `id`
    pub slug: String,

    #[serde(default)]
    pub events: Vec<Message>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Message>,

    /// Opaque rule records; expressions are never evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<FlatState>>,
}

impl LogicUnit {
    /// Flattened states, empty when none were derived
    pub fn states(&self) -> &[FlatState] {
        self.states.as_deref().unwrap_or_default()
    }
}

/// An event or fact declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Message {
    pub fn tag_only(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: None,
            description: None,
        }
    }
}

/// UI component descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<Value>,
}
