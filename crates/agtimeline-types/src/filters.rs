use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::event::{EventType, TimelineEvent};

/// Status selector offered to users; `End` is the user-facing name for `complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Spawn,
    Start,
    End,
    Error,
    Cleanup,
}

impl StatusFilter {
    pub fn matches(&self, event_type: EventType) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Spawn => event_type == EventType::Spawn,
            StatusFilter::Start => event_type == EventType::Start,
            StatusFilter::End => event_type == EventType::Complete,
            StatusFilter::Error => event_type == EventType::Error,
            StatusFilter::Cleanup => event_type == EventType::Cleanup,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Spawn => "spawn",
            StatusFilter::Start => "start",
            StatusFilter::End => "end",
            StatusFilter::Error => "error",
            StatusFilter::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "spawn" => Ok(StatusFilter::Spawn),
            "start" => Ok(StatusFilter::Start),
            "end" => Ok(StatusFilter::End),
            "error" => Ok(StatusFilter::Error),
            "cleanup" => Ok(StatusFilter::Cleanup),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

/// User-selected timeline filters
///
/// Empty `run_id` / `agent_id` mean "no constraint"; non-empty values are
/// case-sensitive substring matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineFilters {
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub status: StatusFilter,
}

impl TimelineFilters {
    pub fn is_empty(&self) -> bool {
        self.run_id.is_empty() && self.agent_id.is_empty() && self.status == StatusFilter::All
    }

    pub fn matches(&self, event: &TimelineEvent) -> bool {
        let run_ok = self.run_id.is_empty()
            || event
                .run_id
                .as_deref()
                .is_some_and(|run| run.contains(self.run_id.as_str()));
        let agent_ok = self.agent_id.is_empty() || event.agent_id.contains(self.agent_id.as_str());

        run_ok && agent_ok && self.status.matches(event.event_type)
    }
}
