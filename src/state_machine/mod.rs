//! State machine module - Flatten, analyze and draw state transition graphs

use crate::schema::LogicUnit;

pub mod analyzer;
pub mod diagram;
pub mod flatten;
pub mod graph;
pub mod state;
pub mod transition;

// Re-export key types
pub use diagram::to_diagram_source;
pub use flatten::{FlattenOutput, flatten, group_transitions, strip_qualifier};
pub use graph::{GraphStats, StateGraph, StateNode};
pub use state::FlatState;
pub use transition::{OutgoingTransition, Transition};

/// Build the state graph of a logic unit
pub fn build_state_graph(logic: &LogicUnit) -> StateGraph {
    StateGraph::from_states(logic.name.clone(), logic.states())
}
