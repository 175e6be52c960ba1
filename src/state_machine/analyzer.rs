//! State machine pattern analyzer
//!
//! Classifies the shape of a flattened state graph so summaries can tell a
//! simple pipeline apart from a looping workflow.

use super::StateGraph;
use petgraph::Direction;
use petgraph::algo::dijkstra;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachinePattern {
    /// A -> B -> C -> D
    Linear,

    /// A -> B
    ///   -> C
    Branching,

    /// A -> B -> A
    Cyclic,

    /// No states at all
    Empty,
}

impl MachinePattern {
    pub fn display_name(&self) -> &'static str {
        match self {
            MachinePattern::Linear => "Linear",
            MachinePattern::Branching => "Branching",
            MachinePattern::Cyclic => "Cyclic",
            MachinePattern::Empty => "Empty",
        }
    }
}

/// Analysis report containing pattern and metrics
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub pattern: MachinePattern,
    pub max_out_degree: usize,

    /// Longest shortest-path distance from the initial state
    pub max_depth: usize,

    pub has_cycles: bool,
}

/// Detect the pattern of a state graph
pub fn detect_pattern(graph: &StateGraph) -> AnalysisReport {
    if graph.graph.node_count() == 0 {
        return AnalysisReport {
            pattern: MachinePattern::Empty,
            max_out_degree: 0,
            max_depth: 0,
            has_cycles: false,
        };
    }

    let has_cycles = petgraph::algo::is_cyclic_directed(&graph.graph);

    let max_out_degree = graph
        .graph
        .node_indices()
        .map(|idx| graph.graph.edges_directed(idx, Direction::Outgoing).count())
        .max()
        .unwrap_or(0);

    let max_depth = graph
        .initial
        .map(|start| {
            dijkstra(&graph.graph, start, None, |_| 1usize)
                .into_values()
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);

    let pattern = if has_cycles {
        MachinePattern::Cyclic
    } else if max_out_degree <= 1 {
        MachinePattern::Linear
    } else {
        MachinePattern::Branching
    };

    AnalysisReport {
        pattern,
        max_out_degree,
        max_depth,
        has_cycles,
    }
}
