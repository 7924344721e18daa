use agtimeline_types::{EventRef, EventType, TimelineEvent};
use std::sync::Arc;

/// Fluent builder for `TimelineEvent`.
///
/// The default id is `<type>-<agent>-<at>`; set an explicit id whenever a
/// test needs duplicates or stable names.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: TimelineEvent,
}

impl EventBuilder {
    pub fn new(event_type: EventType, agent_id: &str, at: i64) -> Self {
        Self {
            event: TimelineEvent {
                id: format!("{}-{}-{}", event_type.as_str(), agent_id, at),
                event_type,
                agent_id: agent_id.to_string(),
                parent_agent_id: None,
                run_id: None,
                at,
                text: String::new(),
            },
        }
    }

    pub fn spawn(agent_id: &str, at: i64) -> Self {
        Self::new(EventType::Spawn, agent_id, at)
    }

    pub fn start(agent_id: &str, at: i64) -> Self {
        Self::new(EventType::Start, agent_id, at)
    }

    pub fn cleanup(agent_id: &str, at: i64) -> Self {
        Self::new(EventType::Cleanup, agent_id, at)
    }

    pub fn error(agent_id: &str, at: i64) -> Self {
        Self::new(EventType::Error, agent_id, at)
    }

    pub fn complete(agent_id: &str, at: i64) -> Self {
        Self::new(EventType::Complete, agent_id, at)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.event.id = id.into();
        self
    }

    pub fn run(mut self, run_id: impl Into<String>) -> Self {
        self.event.run_id = Some(run_id.into());
        self
    }

    pub fn parent(mut self, parent_agent_id: impl Into<String>) -> Self {
        self.event.parent_agent_id = Some(parent_agent_id.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.event.text = text.into();
        self
    }

    pub fn build(self) -> TimelineEvent {
        self.event
    }

    pub fn arc(self) -> EventRef {
        Arc::new(self.event)
    }
}
