//! Legacy hierarchical machine adapter
//!
//! Converts the older `{ id, initial, states }` machine shape into the
//! canonical schema: one logic unit whose states are the flattened tree and
//! whose events are every event name the tree mentions.

use crate::Result;
use crate::parser::{Normalizer, string_prop};
use crate::schema::{CanonicalSchema, LogicUnit, Message, slugify};
use crate::state_machine::{FlattenOutput, flatten};
use serde_json::{Map, Value};

/// Normalizer for legacy machine exports
pub struct LegacyMachineAdapter;

impl Normalizer for LegacyMachineAdapter {
    fn normalize(
        &self,
        export: &Map<String, Value>,
        fallback_name: &str,
    ) -> Result<CanonicalSchema> {
        adapt_legacy(export, fallback_name)
    }
}

/// Convert a legacy machine object into a canonical schema
pub fn adapt_legacy(machine: &Map<String, Value>, fallback_name: &str) -> Result<CanonicalSchema> {
    let name = string_prop(machine, "id").unwrap_or_else(|| fallback_name.to_string());
    let slug = slugify(&name);
    let description = format!("State machine for {} (converted from legacy machine)", name);

    let FlattenOutput { states, events } = match machine.get("states") {
        Some(tree) => flatten(tree, "")?,
        None => FlattenOutput::default(),
    };

    tracing::debug!(
        "Flattened legacy machine {} into {} states and {} events",
        name,
        states.len(),
        events.len()
    );

    let logic = LogicUnit {
        id: name.clone(),
        name: name.clone(),
        description: description.clone(),
        slug: slug.clone(),
        events: events.into_iter().map(Message::tag_only).collect(),
        facts: Vec::new(),
        rules: None,
        constraints: None,
        transitions: Vec::new(),
        states: (!states.is_empty()).then_some(states),
    };

    Ok(CanonicalSchema {
        name,
        slug,
        description,
        version: None,
        models: Vec::new(),
        logic: vec![logic],
        components: None,
        orchestration: None,
        metadata: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn traffic_light() -> Map<String, Value> {
        object(json!({
            "id": "trafficLight",
            "initial": "red",
            "states": {
                "red": {
                    "description": "Stop - vehicles must wait",
                    "on": { "TIMER": { "target": "green", "description": "Light changes to green" } }
                },
                "yellow": {
                    "description": "Caution - prepare to stop",
                    "on": { "TIMER": { "target": "red", "description": "Light changes to red" } }
                },
                "green": {
                    "description": "Go - vehicles may proceed",
                    "on": { "TIMER": { "target": "yellow", "description": "Light changes to yellow" } }
                }
            }
        }))
    }

    #[test]
    fn test_adapt_traffic_light() {
        let schema = adapt_legacy(&traffic_light(), "trafficLightMachine").unwrap();

        assert_eq!(schema.name, "trafficLight");
        assert_eq!(schema.slug, "trafficlight");
        assert_eq!(
            schema.description,
            "State machine for trafficLight (converted from legacy machine)"
        );
        assert!(schema.models.is_empty());
        assert!(schema.components.is_none());
        assert_eq!(schema.logic.len(), 1);

        let logic = &schema.logic[0];
        assert_eq!(logic.id, "trafficLight");
        assert_eq!(logic.slug, "trafficlight");
        assert_eq!(logic.events, vec![Message::tag_only("TIMER")]);
        assert!(logic.transitions.is_empty());
        assert!(logic.facts.is_empty());
        assert!(logic.rules.is_none());

        let states = logic.states();
        assert_eq!(states.len(), 3);
        assert_eq!(states[0].name, "red");
        assert_eq!(states[0].description, "Stop - vehicles must wait");
        assert_eq!(states[0].on[0].target, "green");
    }

    #[test]
    fn test_fallback_name() {
        let schema = adapt_legacy(&object(json!({ "states": {} })), "doorMachine").unwrap();
        assert_eq!(schema.name, "doorMachine");
        assert_eq!(schema.slug, "doormachine");
        // empty trees leave the states list out entirely
        assert!(schema.logic[0].states.is_none());
    }

    #[test]
    fn test_event_union_dedup_first_seen() {
        let machine = object(json!({
            "id": "m",
            "states": {
                "a": { "on": { "X": "b" } },
                "b": {
                    "on": { "Y": "a" },
                    "states": { "inner": { "on": { "X": "#m.a" } } }
                }
            }
        }));
        let schema = adapt_legacy(&machine, "m").unwrap();
        let tags: Vec<&str> = schema.logic[0].events.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["X", "Y"]);
        assert!(schema.logic[0].events.iter().all(|e| e.payload.is_none()));
    }

    #[test]
    fn test_nested_cart_targets_stripped() {
        let machine = object(json!({
            "id": "shoppingCart",
            "states": {
                "active": { "on": { "PROCEED_TO_CHECKOUT": "checkout" } },
                "checkout": {
                    "states": {
                        "shipping": {
                            "on": { "RETURN_TO_CART": { "target": "#shoppingCart.active" } }
                        }
                    }
                }
            }
        }));
        let schema = adapt_legacy(&machine, "cart").unwrap();
        let states = schema.logic[0].states();
        assert_eq!(states[2].name, "checkout.shipping");
        assert_eq!(states[2].on[0].target, "active");
    }

    #[test]
    fn test_non_object_states_do_not_fail() {
        let schema = adapt_legacy(&object(json!({ "id": "odd", "states": "nope" })), "x").unwrap();
        assert!(schema.logic[0].states.is_none());
        assert!(schema.logic[0].events.is_empty());
    }

    #[test]
    fn test_null_state_config_fails() {
        let result = adapt_legacy(&object(json!({ "id": "bad", "states": { "a": null } })), "x");
        assert!(matches!(result, Err(Error::Normalize(_))));
    }
}
