//! Transition representation

use serde::{Deserialize, Serialize};

/// An explicit edge declared by a schema logic unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub event: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An edge leaving a flattened state
///
/// `target` is always a bare state name; machine qualifiers such as
/// `#cart.` are stripped before the edge is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingTransition {
    pub event: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OutgoingTransition {
    pub fn new(event: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            target: target.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

impl From<&Transition> for OutgoingTransition {
    fn from(transition: &Transition) -> Self {
        Self {
            event: transition.event.clone(),
            target: transition.to.clone(),
            description: transition.description.clone(),
        }
    }
}
