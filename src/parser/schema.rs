//! Rich schema normalization
//!
//! Schema exports carry `models`, `logic`, `components`, `orchestration`
//! and `metadata`. Logic units are rebuilt field by field with defaults;
//! everything the documentation layer does not interpret is passed through.

use crate::parser::{Normalizer, array_prop, string_prop};
use crate::schema::{CanonicalSchema, Component, LogicUnit, Message, Model, slugify};
use crate::state_machine::flatten::text_field;
use crate::state_machine::{Transition, group_transitions};
use crate::{Error, Result};
use serde_json::{Map, Value};

const UNKNOWN_NAME: &str = "Unknown";
const UNKNOWN_LOGIC_ID: &str = "unknown-logic";
const UNKNOWN_LOGIC_NAME: &str = "Unknown Logic";
const UNKNOWN_EVENT: &str = "UNKNOWN_EVENT";
const UNKNOWN_FACT: &str = "UNKNOWN_FACT";
const DEFAULT_COMPONENT_KIND: &str = "custom";

/// Normalizer for rich schema exports
pub struct SchemaNormalizer;

impl Normalizer for SchemaNormalizer {
    fn normalize(
        &self,
        export: &Map<String, Value>,
        fallback_name: &str,
    ) -> Result<CanonicalSchema> {
        normalize_schema(export, fallback_name)
    }
}

/// Convert a schema object into a canonical schema
pub fn normalize_schema(
    schema: &Map<String, Value>,
    fallback_name: &str,
) -> Result<CanonicalSchema> {
    let name = string_prop(schema, "name").unwrap_or_else(|| fallback_name.to_string());
    let slug = slugify(&name);
    let description =
        string_prop(schema, "description").unwrap_or_else(|| format!("Schema for {}", name));

    let models = map_entries(schema, "models", normalize_model)?;
    let logic = map_entries(schema, "logic", normalize_logic)?;

    let components = map_entries(schema, "components", normalize_component)?;
    let components = (!components.is_empty()).then_some(components);

    tracing::debug!(
        "Normalized schema {} with {} models and {} logic units",
        name,
        models.len(),
        logic.len()
    );

    Ok(CanonicalSchema {
        version: version_prop(schema),
        name,
        slug,
        description,
        models,
        logic,
        components,
        orchestration: present(schema.get("orchestration")),
        metadata: present(schema.get("metadata")),
    })
}

/// Version string; numeric versions such as `2` or `1.5` are kept as text
fn version_prop(schema: &Map<String, Value>) -> Option<String> {
    match schema.get("version") {
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => string_prop(schema, "version"),
    }
}

fn normalize_model(model: &Value) -> Result<Model> {
    let name = text_field(model, &["name"]).unwrap_or_else(|| UNKNOWN_NAME.to_string());
    Ok(Model {
        description: text_field(model, &["description"])
            .unwrap_or_else(|| format!("Model for {}", name)),
        fields: passthrough(model, "fields"),
        constraints: passthrough(model, "constraints"),
        indexes: passthrough(model, "indexes"),
        relationships: passthrough(model, "relationships"),
        name,
    })
}

fn normalize_logic(logic: &Value) -> Result<LogicUnit> {
    let id = text_field(logic, &["id"]).unwrap_or_else(|| UNKNOWN_LOGIC_ID.to_string());
    let name =
        text_field(logic, &["name", "id"]).unwrap_or_else(|| UNKNOWN_LOGIC_NAME.to_string());
    let description = text_field(logic, &["description"])
        .unwrap_or_else(|| format!("Logic definition for {}", name));

    let events =
        map_value_entries(logic, "events", |event| normalize_message(event, UNKNOWN_EVENT))?;
    let facts = map_value_entries(logic, "facts", |fact| normalize_message(fact, UNKNOWN_FACT))?;
    let transitions = map_value_entries(logic, "transitions", normalize_transition)?;

    let states = (!transitions.is_empty()).then(|| group_transitions(&transitions));

    Ok(LogicUnit {
        slug: slugify(&id),
        id,
        name,
        description,
        events,
        facts,
        rules: non_empty(logic, "rules"),
        constraints: non_empty(logic, "constraints"),
        transitions,
        states,
    })
}

fn normalize_message(message: &Value, sentinel: &str) -> Result<Message> {
    Ok(Message {
        tag: text_field(message, &["tag", "type"]).unwrap_or_else(|| sentinel.to_string()),
        payload: present(message.get("payload")),
        description: text_field(message, &["description", "desc"]),
    })
}

fn normalize_transition(transition: &Value) -> Result<Transition> {
    Ok(Transition {
        from: text_field(transition, &["from"]).unwrap_or_default(),
        event: text_field(transition, &["event"]).unwrap_or_default(),
        to: text_field(transition, &["to", "target"]).unwrap_or_default(),
        description: text_field(transition, &["description", "desc"]),
    })
}

fn normalize_component(component: &Value) -> Result<Component> {
    Ok(Component {
        name: text_field(component, &["name"]).unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        kind: text_field(component, &["type"])
            .unwrap_or_else(|| DEFAULT_COMPONENT_KIND.to_string()),
        model: text_field(component, &["model"]),
        description: text_field(component, &["description", "desc"]),
        props: passthrough(component, "props"),
        events: passthrough(component, "events"),
        layout: present(component.get("layout")),
        styling: present(component.get("styling")),
    })
}

/// Map every entry of an array property of a schema object
fn map_entries<T>(
    object: &Map<String, Value>,
    key: &str,
    f: impl Fn(&Value) -> Result<T>,
) -> Result<Vec<T>> {
    let Some(entries) = array_prop(object, key) else {
        return Ok(Vec::new());
    };
    map_array(entries, key, f)
}

/// Map every entry of an array property of an arbitrary value
fn map_value_entries<T>(
    value: &Value,
    key: &str,
    f: impl Fn(&Value) -> Result<T>,
) -> Result<Vec<T>> {
    let Some(entries) = value.get(key).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    map_array(entries, key, f)
}

fn map_array<T>(entries: &[Value], key: &str, f: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.is_null() {
                return Err(Error::normalize(format!("{}[{}] is null", key, index)));
            }
            f(entry)
        })
        .collect()
}

fn passthrough(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn non_empty(value: &Value, key: &str) -> Option<Vec<Value>> {
    value
        .get(key)
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())
        .cloned()
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn task_schema() -> Map<String, Value> {
        object(json!({
            "version": "1.2.0",
            "name": "TaskManagement",
            "description": "Task management application",
            "models": [
                {
                    "name": "Task",
                    "fields": [ { "name": "id", "type": "string" } ],
                    "indexes": [ { "name": "by_status", "fields": ["status"] } ]
                }
            ],
            "logic": [
                {
                    "id": "task-state-machine",
                    "name": "Task State Machine",
                    "events": [
                        { "tag": "TASK_ASSIGN", "payload": { "assignee": "string" }, "description": "Assign" },
                        { "type": "TASK_START", "desc": "Start" },
                        {}
                    ],
                    "facts": [ { "tag": "TaskAssigned" }, { "payload": {} } ],
                    "rules": [ { "id": "r1", "when": "event.payload.priority >= 4" } ],
                    "constraints": [],
                    "transitions": [
                        { "from": "new", "event": "ASSIGN", "to": "assigned" },
                        { "from": "new", "event": "CANCEL", "target": "cancelled", "desc": "Cancel early" },
                        { "from": "assigned", "event": "START", "to": "in_progress" }
                    ]
                }
            ],
            "orchestration": { "type": "mcp" },
            "metadata": { "author": "Team" }
        }))
    }

    #[test]
    fn test_schema_header() {
        let schema = normalize_schema(&task_schema(), "taskSchema").unwrap();
        assert_eq!(schema.name, "TaskManagement");
        assert_eq!(schema.slug, "taskmanagement");
        assert_eq!(schema.description, "Task management application");
        assert_eq!(schema.version.as_deref(), Some("1.2.0"));
        assert_eq!(schema.orchestration, Some(json!({ "type": "mcp" })));
        assert_eq!(schema.metadata, Some(json!({ "author": "Team" })));
    }

    #[test]
    fn test_defaults_from_fallback() {
        let schema = normalize_schema(&object(json!({ "models": [] })), "appSchema").unwrap();
        assert_eq!(schema.name, "appSchema");
        assert_eq!(schema.description, "Schema for appSchema");
        assert!(schema.logic.is_empty());
        assert!(schema.components.is_none());
        assert!(schema.version.is_none());
    }

    #[test]
    fn test_numeric_version_kept_as_text() {
        let schema = normalize_schema(&object(json!({ "version": 2 })), "a").unwrap();
        assert_eq!(schema.version.as_deref(), Some("2"));

        let schema = normalize_schema(&object(json!({ "version": 1.5 })), "a").unwrap();
        assert_eq!(schema.version.as_deref(), Some("1.5"));

        let schema = normalize_schema(&object(json!({ "version": true })), "a").unwrap();
        assert!(schema.version.is_none());
    }

    #[test]
    fn test_models() {
        let schema = normalize_schema(&task_schema(), "x").unwrap();
        let model = &schema.models[0];
        assert_eq!(model.name, "Task");
        assert_eq!(model.description, "Model for Task");
        assert_eq!(model.fields.len(), 1);
        assert_eq!(model.indexes.len(), 1);
        assert!(model.constraints.is_empty());
        assert!(model.relationships.is_empty());
    }

    #[test]
    fn test_logic_messages() {
        let schema = normalize_schema(&task_schema(), "x").unwrap();
        let logic = &schema.logic[0];
        assert_eq!(logic.slug, "task-state-machine");
        assert_eq!(logic.description, "Logic definition for Task State Machine");

        assert_eq!(logic.events[0].tag, "TASK_ASSIGN");
        assert_eq!(logic.events[0].payload, Some(json!({ "assignee": "string" })));
        assert_eq!(logic.events[1].tag, "TASK_START");
        assert_eq!(logic.events[1].description.as_deref(), Some("Start"));
        assert_eq!(logic.events[2].tag, "UNKNOWN_EVENT");

        assert_eq!(logic.facts[1].tag, "UNKNOWN_FACT");
    }

    #[test]
    fn test_rules_and_constraints_passthrough() {
        let schema = normalize_schema(&task_schema(), "x").unwrap();
        let logic = &schema.logic[0];
        let rules = logic.rules.as_ref().unwrap();
        assert_eq!(rules[0]["when"], "event.payload.priority >= 4");
        // empty constraint arrays are omitted
        assert!(logic.constraints.is_none());
    }

    #[test]
    fn test_transitions_grouped_into_states() {
        let schema = normalize_schema(&task_schema(), "x").unwrap();
        let logic = &schema.logic[0];

        assert_eq!(logic.transitions[1].to, "cancelled");
        assert_eq!(logic.transitions[1].description.as_deref(), Some("Cancel early"));

        let states = logic.states();
        let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["new", "assigned"]);
        let events: Vec<&str> = states[0].on.iter().map(|t| t.event.as_str()).collect();
        assert_eq!(events, vec!["ASSIGN", "CANCEL"]);
    }

    #[test]
    fn test_logic_id_fallback_chain() {
        let schema = normalize_schema(
            &object(json!({ "logic": [ { "id": "checkout" }, {} ] })),
            "s",
        )
        .unwrap();
        assert_eq!(schema.logic[0].name, "checkout");
        assert_eq!(schema.logic[1].id, "unknown-logic");
        assert_eq!(schema.logic[1].name, "Unknown Logic");
        assert!(schema.logic[1].states.is_none());
    }

    #[test]
    fn test_components() {
        let schema = normalize_schema(
            &object(json!({
                "models": [],
                "components": [
                    { "name": "TaskForm", "type": "form", "model": "Task", "layout": { "gap": 16 } },
                    { "description": "Board" }
                ]
            })),
            "s",
        )
        .unwrap();
        let components = schema.components.unwrap();
        assert_eq!(components[0].kind, "form");
        assert_eq!(components[0].model.as_deref(), Some("Task"));
        assert_eq!(components[0].layout, Some(json!({ "gap": 16 })));
        assert_eq!(components[1].name, "Unknown");
        assert_eq!(components[1].kind, "custom");
    }

    #[test]
    fn test_empty_components_omitted() {
        let schema =
            normalize_schema(&object(json!({ "models": [], "components": [] })), "s").unwrap();
        assert!(schema.components.is_none());
    }

    #[test]
    fn test_null_entries_are_malformed() {
        for bad in [
            json!({ "logic": [null] }),
            json!({ "models": [null] }),
            json!({ "logic": [ { "events": [null] } ] }),
            json!({ "logic": [ { "transitions": [null] } ] }),
        ] {
            let result = normalize_schema(&object(bad), "s");
            assert!(matches!(result, Err(Error::Normalize(_))));
        }
    }
}
