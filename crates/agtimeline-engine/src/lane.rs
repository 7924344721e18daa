use agtimeline_types::EventRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Lane id used for agents whose room cannot be resolved
pub const UNASSIGNED_LANE_ID: &str = "unassigned";

/// How loaded events are split into parallel lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneMode {
    Room,
    #[default]
    Agent,
    Subagent,
}

impl LaneMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneMode::Room => "room",
            LaneMode::Agent => "agent",
            LaneMode::Subagent => "subagent",
        }
    }
}

impl fmt::Display for LaneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaneMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "room" => Ok(LaneMode::Room),
            "agent" => Ok(LaneMode::Agent),
            "subagent" => Ok(LaneMode::Subagent),
            other => Err(format!("unknown lane mode: {}", other)),
        }
    }
}

/// External agent id -> room id lookup used by `LaneMode::Room`
pub trait RoomResolver {
    fn resolve_room_id(&self, agent_id: &str) -> Option<String>;
}

impl<F> RoomResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve_room_id(&self, agent_id: &str) -> Option<String> {
        self(agent_id)
    }
}

impl RoomResolver for HashMap<String, String> {
    fn resolve_room_id(&self, agent_id: &str) -> Option<String> {
        self.get(agent_id).cloned()
    }
}

/// Resolver for callers without room data; every agent lands in the unassigned lane
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRooms;

impl RoomResolver for NoRooms {
    fn resolve_room_id(&self, _agent_id: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lane {
    /// `mode:id`, stable across rebuilds
    pub key: String,
    pub id: String,
    pub mode: LaneMode,
    pub label: String,
    /// Parent agent, only set in subagent mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Newest first
    pub events: Vec<EventRef>,
    pub event_count: usize,
    pub run_count: usize,
    pub density_per_minute: u64,
}

struct LaneAccumulator {
    events: Vec<EventRef>,
    parent_id: Option<String>,
}

/// Group loaded events into lanes.
///
/// Lanes with more events come first; ties keep the order in which each
/// lane's first event was seen, so near-equal lanes do not swap between
/// rebuilds. Events inside a lane keep the input order.
pub fn partition_lanes(events: &[EventRef], mode: LaneMode, rooms: &dyn RoomResolver) -> Vec<Lane> {
    let mut lanes: IndexMap<String, LaneAccumulator> = IndexMap::new();
    let mut room_cache: HashMap<&str, Option<String>> = HashMap::new();

    for event in events {
        let lane_id = match mode {
            LaneMode::Room => room_cache
                .entry(event.agent_id.as_str())
                .or_insert_with(|| {
                    rooms
                        .resolve_room_id(&event.agent_id)
                        .filter(|room| !room.is_empty())
                })
                .clone()
                .unwrap_or_else(|| UNASSIGNED_LANE_ID.to_string()),
            // Sub-agent events stay on the acting agent's lane in both modes
            LaneMode::Agent | LaneMode::Subagent => event.agent_id.clone(),
        };

        let lane = lanes.entry(lane_id).or_insert_with(|| LaneAccumulator {
            events: Vec::new(),
            parent_id: None,
        });
        if mode == LaneMode::Subagent && lane.parent_id.is_none() {
            lane.parent_id = event.parent_agent_id.clone().filter(|p| !p.is_empty());
        }
        lane.events.push(event.clone());
    }

    let parents: HashMap<String, String> = lanes
        .iter()
        .filter_map(|(id, lane)| lane.parent_id.clone().map(|p| (id.clone(), p)))
        .collect();

    let mut result: Vec<Lane> = lanes
        .into_iter()
        .map(|(id, acc)| {
            let label = lane_label(mode, &id, &parents);
            build_lane(mode, id, label, acc)
        })
        .collect();

    // Stable sort: ties keep first-seen order
    result.sort_by(|a, b| b.event_count.cmp(&a.event_count));
    result
}

fn build_lane(mode: LaneMode, id: String, label: String, acc: LaneAccumulator) -> Lane {
    let run_count = acc
        .events
        .iter()
        .filter_map(|e| e.run_id())
        .collect::<HashSet<_>>()
        .len();
    let density_per_minute = density_per_minute(&acc.events);

    Lane {
        key: format!("{}:{}", mode.as_str(), id),
        event_count: acc.events.len(),
        run_count,
        density_per_minute,
        parent_id: acc.parent_id,
        events: acc.events,
        label,
        mode,
        id,
    }
}

fn lane_label(mode: LaneMode, id: &str, parents: &HashMap<String, String>) -> String {
    match mode {
        LaneMode::Room if id == UNASSIGNED_LANE_ID => "Unassigned".to_string(),
        LaneMode::Room | LaneMode::Agent => id.to_string(),
        LaneMode::Subagent => {
            let mut chain = vec![id];
            let mut visited: HashSet<&str> = HashSet::from([id]);
            let mut cursor = id;
            while let Some(parent) = parents.get(cursor) {
                if !visited.insert(parent.as_str()) {
                    break;
                }
                chain.push(parent.as_str());
                cursor = parent.as_str();
            }
            // The top-most parent may have no lane of its own
            chain.reverse();
            chain.join(" > ")
        }
    }
}

/// Events per minute over the lane's time span; spans under a minute count as one minute
pub fn density_per_minute(events: &[EventRef]) -> u64 {
    let (Some(min), Some(max)) = (
        events.iter().map(|e| e.at).min(),
        events.iter().map(|e| e.at).max(),
    ) else {
        return 0;
    };

    let minutes = (max.saturating_sub(min) as f64 / 60_000.0).max(1.0);
    (events.len() as f64 / minutes).round() as u64
}
