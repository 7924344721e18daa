use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::SnapshotError;
use crate::event::{EventType, TimelineEvent};
use crate::run_graph::RunGraph;

/// Dashboard entity (agent, room, tool...) carried by a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSource {
    #[serde(default)]
    pub live: bool,
}

/// Full dashboard state delivered by `GET /snapshot` or a `snapshot` stream frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub generated_at: i64,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub run_graph: RunGraph,
    #[serde(default)]
    pub source: SnapshotSource,
}

impl Snapshot {
    pub fn from_json_str(input: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Validate a loosely typed payload and convert it into a typed snapshot.
    ///
    /// Only the envelope is mandatory: a non-object root or a missing
    /// `events` array rejects the payload. Events that fail their field
    /// checks are skipped and malformed optional sections fall back to
    /// their defaults; both are reported with `warn!`.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let mut root = match value {
            Value::Object(map) => map,
            other => return Err(SnapshotError::NotAnObject(json_kind(&other))),
        };

        let events = match root.remove("events") {
            Some(Value::Array(items)) => items,
            _ => return Err(SnapshotError::MissingField("events")),
        };
        let received = events.len();
        let events: Vec<TimelineEvent> = events
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                parse_event(index, item)
                    .inspect_err(|err| warn!(error = %err, "skipping snapshot event"))
                    .ok()
            })
            .collect();
        if events.len() < received {
            debug!(received, kept = events.len(), "snapshot events skipped");
        }

        let generated_at = match root.get("generatedAt") {
            None | Some(Value::Null) => 0,
            Some(v) => v.as_i64().unwrap_or_else(|| {
                let err = SnapshotError::InvalidSection {
                    field: "generatedAt",
                    reason: "expected an integer timestamp".to_string(),
                };
                warn!(error = %err, "using default");
                0
            }),
        };

        Ok(Snapshot {
            generated_at,
            entities: optional_section(&mut root, "entities"),
            events,
            run_graph: optional_section(&mut root, "runGraph"),
            source: optional_section(&mut root, "source"),
        })
    }

    /// agent id -> room id, as declared by the snapshot's entities
    pub fn room_assignments(&self) -> HashMap<String, String> {
        self.entities
            .iter()
            .filter_map(|e| {
                e.room_id
                    .as_ref()
                    .filter(|room| !room.is_empty())
                    .map(|room| (e.id.clone(), room.clone()))
            })
            .collect()
    }

    /// The supplied run graph, or one derived from the events when the snapshot has none
    pub fn run_graph_or_derived(&self) -> RunGraph {
        if self.run_graph.is_empty() && !self.events.is_empty() {
            RunGraph::from_events(&self.events)
        } else {
            self.run_graph.clone()
        }
    }
}

/// Optional section, or its default when absent or malformed
fn optional_section<T>(root: &mut Map<String, Value>, field: &'static str) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    match root.remove(field).map(serde_json::from_value) {
        None | Some(Ok(None)) => T::default(),
        Some(Ok(Some(value))) => value,
        Some(Err(e)) => {
            let err = SnapshotError::InvalidSection {
                field,
                reason: e.to_string(),
            };
            warn!(error = %err, "using default");
            T::default()
        }
    }
}

fn parse_event(index: usize, item: Value) -> Result<TimelineEvent, SnapshotError> {
    let invalid = |reason: String| SnapshotError::InvalidEvent { index, reason };

    let Some(obj) = item.as_object() else {
        return Err(invalid(format!("expected object, got {}", json_kind(&item))));
    };

    match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {}
        _ => return Err(invalid("`id` must be a non-empty string".to_string())),
    }

    match obj.get("type").and_then(Value::as_str) {
        Some(t) if EventType::parse(t).is_some() => {}
        Some(t) => return Err(invalid(format!("unknown event type `{}`", t))),
        None => return Err(invalid("`type` must be a string".to_string())),
    }

    if !obj.get("agentId").is_some_and(Value::is_string) {
        return Err(invalid("`agentId` must be a string".to_string()));
    }

    if obj.get("at").and_then(Value::as_i64).is_none() {
        return Err(invalid("`at` must be an integer timestamp".to_string()));
    }

    serde_json::from_value(item).map_err(|e| invalid(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
