//! Flattened state representation

use crate::schema::slugify;
use crate::state_machine::OutgoingTransition;
use serde::{Deserialize, Serialize};

/// One node of a flattened transition graph
///
/// `name` keeps the full dot-separated ancestry of nested source states
/// (`checkout.payment`); top-level states carry no dot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatState {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub on: Vec<OutgoingTransition>,
}

impl FlatState {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            name,
            description: description.into(),
            on: Vec::new(),
        }
    }

    pub fn with_transitions(mut self, on: Vec<OutgoingTransition>) -> Self {
        self.on = on;
        self
    }

    /// Ancestry path of this state without its own segment
    pub fn parent_path(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(parent, _)| parent)
    }
}
