//! State-tree flattening
//!
//! Hierarchical state maps are walked in pre-order (parent before children,
//! children in declaration order) and turned into a flat list of
//! [`FlatState`]s with fully qualified names and bare transition targets.

use crate::state_machine::{FlatState, OutgoingTransition, Transition};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Result of flattening a state tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenOutput {
    pub states: Vec<FlatState>,

    /// Every event name found in an `on` map, deduplicated, first-seen order
    pub events: Vec<String>,
}

/// Flatten a nested state map into an ordered list of states.
///
/// `state_map` maps local state names to their configuration. Anything that
/// is not an object flattens to an empty output. `prefix` is the ancestry of
/// the map's states; pass `""` for the top level.
pub fn flatten(state_map: &Value, prefix: &str) -> Result<FlattenOutput> {
    let mut output = FlattenOutput::default();
    let mut seen_events = HashSet::new();
    flatten_into(state_map, prefix, &mut output, &mut seen_events)?;
    Ok(output)
}

fn flatten_into(
    state_map: &Value,
    prefix: &str,
    output: &mut FlattenOutput,
    seen_events: &mut HashSet<String>,
) -> Result<()> {
    let Some(entries) = state_map.as_object() else {
        return Ok(());
    };

    for (local_name, config) in entries {
        let full_name = if prefix.is_empty() {
            local_name.clone()
        } else {
            format!("{}.{}", prefix, local_name)
        };

        if config.is_null() {
            return Err(Error::normalize(format!(
                "state `{}` has a null configuration",
                full_name
            )));
        }

        let description = text_field(config, &["description", "desc"]).unwrap_or_default();

        let mut on = Vec::new();
        if let Some(handlers) = config.get("on").and_then(Value::as_object) {
            for (event, transition) in handlers {
                if seen_events.insert(event.clone()) {
                    output.events.push(event.clone());
                }

                let (target, transition_description) = resolve_transition(transition);
                let target = strip_qualifier(&target);
                if target.is_empty() {
                    tracing::debug!("Dropping unresolvable {} transition in {}", event, full_name);
                    continue;
                }

                on.push(
                    OutgoingTransition::new(event.clone(), target)
                        .with_description(transition_description),
                );
            }
        }

        output
            .states
            .push(FlatState::new(full_name.clone(), description).with_transitions(on));

        if let Some(nested) = config.get("states")
            && nested.is_object()
        {
            flatten_into(nested, &full_name, output, seen_events)?;
        }
    }

    Ok(())
}

/// Resolve an `on` entry to its raw target and optional description
fn resolve_transition(transition: &Value) -> (String, Option<String>) {
    match transition {
        Value::String(target) => (target.clone(), None),
        Value::Object(_) => {
            let target = text_field(transition, &["target"]).unwrap_or_default();
            let description = text_field(transition, &["description", "desc"]);
            (target, description)
        }
        _ => (String::new(), None),
    }
}

/// Drop a leading `#machineId.` qualifier from a transition target.
///
/// Only targets starting with `#` and carrying at least one character
/// before the first `.` are rewritten.
pub fn strip_qualifier(target: &str) -> &str {
    if let Some(rest) = target.strip_prefix('#')
        && let Some((machine_id, bare)) = rest.split_once('.')
        && !machine_id.is_empty()
    {
        return bare;
    }
    target
}

/// Group explicit transitions by their source state.
///
/// Groups appear in first-seen order of `from`, and each group keeps the
/// insertion order of its transitions. Grouping is keyed by the raw `from`
/// name, so names sharing a slug never merge.
pub fn group_transitions(transitions: &[Transition]) -> Vec<FlatState> {
    let mut states: Vec<FlatState> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for transition in transitions {
        let position = *index.entry(transition.from.as_str()).or_insert_with(|| {
            states.push(FlatState::new(
                transition.from.clone(),
                format!("State: {}", transition.from),
            ));
            states.len() - 1
        });
        states[position].on.push(OutgoingTransition::from(transition));
    }

    states
}

/// First non-empty string among `keys`
pub(crate) fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
