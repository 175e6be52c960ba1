use crate::state_machine::{FlatState, OutgoingTransition};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use std::collections::HashMap;

/// A node of the state graph
#[derive(Debug, Clone, PartialEq)]
pub struct StateNode {
    pub name: String,
    pub slug: String,

    /// False for transition targets that match no declared state
    pub declared: bool,
}

/// A directed graph built from flattened states.
///
/// Nodes are states and edges are the transitions between them. Bare
/// targets are resolved against the source state's siblings first, then
/// each ancestor level, then the top level; targets that resolve nowhere
/// become undeclared nodes.
pub struct StateGraph {
    pub graph: StableGraph<StateNode, OutgoingTransition>,

    /// Lookup table from fully qualified state name to graph index
    pub state_index: HashMap<String, NodeIndex>,

    /// Index of the first declared state
    pub initial: Option<NodeIndex>,

    pub name: String,
}

impl StateGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: StableGraph::new(),
            state_index: HashMap::new(),
            initial: None,
            name: name.into(),
        }
    }

    pub fn from_states(name: impl Into<String>, states: &[FlatState]) -> Self {
        let mut graph = Self::new(name);

        for state in states {
            graph.add_state(state, true);
        }
        graph.initial = states
            .first()
            .and_then(|state| graph.state_index.get(&state.name).copied());

        for state in states {
            let Some(&from_idx) = graph.state_index.get(&state.name) else {
                continue;
            };
            for transition in &state.on {
                let to_idx = graph.resolve_target(state, &transition.target);
                graph.graph.add_edge(from_idx, to_idx, transition.clone());
            }
        }

        graph
    }

    fn add_state(&mut self, state: &FlatState, declared: bool) -> NodeIndex {
        if let Some(&idx) = self.state_index.get(&state.name) {
            return idx;
        }
        let idx = self.graph.add_node(StateNode {
            name: state.name.clone(),
            slug: state.slug.clone(),
            declared,
        });
        self.state_index.insert(state.name.clone(), idx);
        idx
    }

    fn resolve_target(&mut self, source: &FlatState, target: &str) -> NodeIndex {
        let mut scope = source.parent_path();
        while let Some(prefix) = scope {
            let candidate = format!("{}.{}", prefix, target);
            if let Some(&idx) = self.state_index.get(&candidate) {
                return idx;
            }
            scope = prefix.rsplit_once('.').map(|(parent, _)| parent);
        }

        if let Some(&idx) = self.state_index.get(target) {
            return idx;
        }

        tracing::debug!("Transition target {} matches no declared state", target);
        self.add_state(&FlatState::new(target, ""), false)
    }

    /// Declared states without incoming edges
    pub fn find_initial_states(&self) -> Vec<&StateNode> {
        self.declared_nodes()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Declared states without outgoing edges
    pub fn find_terminal_states(&self) -> Vec<&StateNode> {
        self.declared_nodes()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Targets that match no declared state
    pub fn dangling_targets(&self) -> Vec<&StateNode> {
        self.graph
            .node_weights()
            .filter(|node| !node.declared)
            .collect()
    }

    fn declared_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.node_weight(idx).is_some_and(|node| node.declared))
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = format!("digraph \"{}\" {{\n", escape(&self.name));
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        if let Some(initial) = self.initial.and_then(|idx| self.graph.node_weight(idx)) {
            dot.push_str("  \"__start\" [shape=point, label=\"\"];\n");
            dot.push_str(&format!("  \"__start\" -> \"{}\";\n", escape(&initial.slug)));
        }

        for node in self.graph.node_weights() {
            let style = if node.declared { "" } else { ", style=dashed" };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\"{}];\n",
                escape(&node.slug),
                escape(&node.name),
                style
            ));
        }

        dot.push('\n');

        for edge_idx in self.graph.edge_indices() {
            if let Some((from_idx, to_idx)) = self.graph.edge_endpoints(edge_idx)
                && let (Some(from), Some(to), Some(transition)) = (
                    self.graph.node_weight(from_idx),
                    self.graph.node_weight(to_idx),
                    self.graph.edge_weight(edge_idx),
                )
            {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    escape(&from.slug),
                    escape(&to.slug),
                    escape(&transition.event)
                ));
            }
        }

        dot.push_str("}\n");
        dot
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_states: self.declared_nodes().count(),
            total_transitions: self.graph.edge_count(),
            initial_states: self.find_initial_states().len(),
            terminal_states: self.find_terminal_states().len(),
            dangling_targets: self.dangling_targets().len(),
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub total_states: usize,
    pub total_transitions: usize,
    pub initial_states: usize,
    pub terminal_states: usize,
    pub dangling_targets: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::flatten;
    use serde_json::json;

    fn cart_states() -> Vec<FlatState> {
        let tree = json!({
            "empty": { "on": { "ADD_ITEM": "active" } },
            "active": { "on": { "CHECKOUT": "checkout" } },
            "checkout": {
                "states": {
                    "shipping": { "on": { "NEXT": "payment", "BACK": "#cart.active" } },
                    "payment": { "on": { "PAY": "#cart.done" } }
                }
            },
            "done": {}
        });
        flatten(&tree, "").unwrap().states
    }

    #[test]
    fn test_empty_graph() {
        let graph = StateGraph::new("empty");
        assert_eq!(graph.graph.node_count(), 0);
        assert_eq!(graph.graph.edge_count(), 0);
        assert!(graph.initial.is_none());
    }

    #[test]
    fn test_sibling_resolution() {
        let graph = StateGraph::from_states("cart", &cart_states());

        let shipping = graph.state_index["checkout.shipping"];
        let payment = graph.state_index["checkout.payment"];
        assert!(graph.graph.find_edge(shipping, payment).is_some());

        let active = graph.state_index["active"];
        assert!(graph.graph.find_edge(shipping, active).is_some());
        assert!(graph.dangling_targets().is_empty());
    }

    #[test]
    fn test_stats() {
        let graph = StateGraph::from_states("cart", &cart_states());
        let stats = graph.stats();
        assert_eq!(stats.total_states, 6);
        assert_eq!(stats.total_transitions, 5);
        // nothing enters `empty` or the nested `checkout.shipping`
        assert_eq!(stats.initial_states, 2);
        // `checkout` has no edges of its own; `done` is final
        assert_eq!(stats.terminal_states, 2);
        assert_eq!(stats.dangling_targets, 0);
    }

    #[test]
    fn test_dangling_target() {
        let states = vec![
            FlatState::new("a", "").with_transitions(vec![OutgoingTransition::new("GO", "ghost")]),
        ];
        let graph = StateGraph::from_states("m", &states);
        let stats = graph.stats();
        assert_eq!(stats.total_states, 1);
        assert_eq!(stats.dangling_targets, 1);
        assert!(graph.to_dot().contains("\"ghost\" [label=\"ghost\", style=dashed];"));
    }

    #[test]
    fn test_to_dot_output() {
        let graph = StateGraph::from_states("cart", &cart_states());
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph \"cart\" {"));
        assert!(dot.contains("\"__start\" -> \"empty\";"));
        assert!(dot.contains("\"checkout-shipping\" -> \"checkout-payment\" [label=\"NEXT\"];"));
        assert!(dot.ends_with("}\n"));
    }
}
