//! Mermaid state-diagram derivation

use crate::schema::slugify;
use crate::state_machine::FlatState;

/// First line of every derived diagram
pub const DIAGRAM_HEADER: &str = "stateDiagram-v2";

/// Initial arrow target used when there are no states
const FALLBACK_INITIAL: &str = "start";

/// Render flattened states as Mermaid `stateDiagram-v2` source.
///
/// The initial arrow points at the first state. Each transition becomes one
/// `source --> target: EVENT` line in state order, then transition order.
/// Targets are re-slugified here and are not checked against the declared
/// states. Event labels are emitted verbatim.
pub fn to_diagram_source(states: &[FlatState]) -> String {
    let initial = states
        .first()
        .map(|state| state.slug.as_str())
        .unwrap_or(FALLBACK_INITIAL);

    let mut lines = vec![
        DIAGRAM_HEADER.to_string(),
        format!("  [*] --> {}", initial),
    ];

    lines.extend(states.iter().flat_map(|state| {
        state.on.iter().map(move |transition| {
            format!(
                "  {} --> {}: {}",
                state.slug,
                slugify(&transition.target),
                transition.event
            )
        })
    }));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::OutgoingTransition;

    fn traffic_light() -> Vec<FlatState> {
        vec![
            FlatState::new("red", "Stop")
                .with_transitions(vec![OutgoingTransition::new("TIMER", "green")]),
            FlatState::new("green", "Go")
                .with_transitions(vec![OutgoingTransition::new("TIMER", "yellow")]),
            FlatState::new("yellow", "Caution")
                .with_transitions(vec![OutgoingTransition::new("TIMER", "red")]),
        ]
    }

    #[test]
    fn test_diagram_for_traffic_light() {
        let diagram = to_diagram_source(&traffic_light());
        let lines: Vec<&str> = diagram.lines().collect();

        assert_eq!(lines[0], "stateDiagram-v2");
        assert_eq!(lines[1], "  [*] --> red");
        assert!(lines.contains(&"  red --> green: TIMER"));
        assert_eq!(lines.len(), 5);
        assert!(!diagram.ends_with('\n'));
    }

    #[test]
    fn test_empty_states_use_fallback() {
        assert_eq!(to_diagram_source(&[]), "stateDiagram-v2\n  [*] --> start");
    }

    #[test]
    fn test_dangling_and_nested_targets_are_slugified() {
        let states = vec![FlatState::new("checkout.shipping", "").with_transitions(vec![
            OutgoingTransition::new("NEXT", "Payment Step"),
            OutgoingTransition::new("BACK", "nowhere"),
        ])];
        let diagram = to_diagram_source(&states);
        assert!(diagram.contains("  checkout-shipping --> payment-step: NEXT"));
        assert!(diagram.contains("  checkout-shipping --> nowhere: BACK"));
    }
}
