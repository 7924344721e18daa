use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// NOTE: Event Model
//
// Events are immutable facts owned by the log source. Downstream layers
// only reference and reorder them (EventRef), never mutate.
//
// - `at` is epoch milliseconds and is NOT guaranteed to be monotonic:
//   events may arrive out of order, so every consumer sorts explicitly.
// - `run_id` may be absent; such events stay indexed by id and time but
//   never contribute to run-scoped features (run counts, run bursts).
// - `parent_agent_id` absent means a root agent.

/// Shared handle to an event; the engine passes these around instead of cloning payloads
pub type EventRef = Arc<TimelineEvent>;

/// Lifecycle event type emitted for an agent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Spawn,
    Start,
    Cleanup,
    Error,
    Complete,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Spawn,
        EventType::Start,
        EventType::Cleanup,
        EventType::Error,
        EventType::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Spawn => "spawn",
            EventType::Start => "start",
            EventType::Cleanup => "cleanup",
            EventType::Error => "error",
            EventType::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timeline event
/// Maps 1:1 to an entry of the snapshot `events` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// Event ID (unique per log, duplicates tolerated)
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Acting agent
    pub agent_id: String,

    /// Spawning agent; None for root agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_agent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Epoch milliseconds
    pub at: i64,

    /// Human-readable description
    #[serde(default)]
    pub text: String,
}

impl TimelineEvent {
    pub fn is_subagent(&self) -> bool {
        self.parent_agent_id.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref().filter(|r| !r.is_empty())
    }
}
