use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::event::{EventType, TimelineEvent};

/// One run in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunNode {
    pub run_id: String,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Spawn relationship: `from` run spawned `to` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTimeRange {
    pub start: i64,
    pub end: i64,
}

impl RunTimeRange {
    pub fn duration_ms(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}

/// Parent/child run relationships supplied alongside the event log.
///
/// Treated as authoritative read-only context: the engine uses it to label
/// lanes and summaries but never recomputes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunGraph {
    #[serde(default)]
    pub nodes: Vec<RunNode>,
    #[serde(default)]
    pub edges: Vec<RunEdge>,
    /// run id -> agent id
    #[serde(default)]
    pub run_agents: HashMap<String, String>,
    /// agent id -> run ids
    #[serde(default)]
    pub agent_runs: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub time_ranges: HashMap<String, RunTimeRange>,
}

impl RunGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, run_id: &str) -> Option<&RunNode> {
        self.nodes.iter().find(|n| n.run_id == run_id)
    }

    pub fn agent_for_run(&self, run_id: &str) -> Option<&str> {
        self.run_agents.get(run_id).map(String::as_str)
    }

    pub fn runs_for_agent(&self, agent_id: &str) -> &[String] {
        self.agent_runs
            .get(agent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn time_range(&self, run_id: &str) -> Option<RunTimeRange> {
        self.time_ranges.get(run_id).copied()
    }

    pub fn children(&self, run_id: &str) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(move |e| e.from == run_id)
            .map(|e| e.to.as_str())
    }

    /// Display label for a run: explicit node label, else `agent/run`, else the run id
    pub fn run_label(&self, run_id: &str) -> String {
        if let Some(label) = self.node(run_id).and_then(|n| n.label.clone()) {
            return label;
        }
        match self.agent_for_run(run_id) {
            Some(agent) => format!("{}/{}", agent, run_id),
            None => run_id.to_string(),
        }
    }

    /// Derive a graph from raw events.
    ///
    /// Only used when a snapshot arrives without a graph (fixtures, CLI input
    /// files). Spawn edges are inferred from `parent_agent_id`: a run whose
    /// agent has a parent is linked to the parent agent's earliest run.
    pub fn from_events(events: &[TimelineEvent]) -> Self {
        let mut graph = RunGraph::default();
        let mut parent_agents: HashMap<String, String> = HashMap::new();

        for event in events {
            let Some(run_id) = event.run_id() else {
                continue;
            };

            graph
                .run_agents
                .entry(run_id.to_string())
                .or_insert_with(|| event.agent_id.clone());

            let runs = graph.agent_runs.entry(event.agent_id.clone()).or_default();
            if !runs.iter().any(|r| r == run_id) {
                runs.push(run_id.to_string());
            }

            graph
                .time_ranges
                .entry(run_id.to_string())
                .and_modify(|range| {
                    range.start = range.start.min(event.at);
                    range.end = range.end.max(event.at);
                })
                .or_insert(RunTimeRange {
                    start: event.at,
                    end: event.at,
                });

            if let Some(parent) = event.parent_agent_id.as_deref().filter(|p| !p.is_empty()) {
                parent_agents
                    .entry(run_id.to_string())
                    .or_insert_with(|| parent.to_string());
            }

            if event.event_type == EventType::Spawn && graph.node(run_id).is_none() {
                graph.nodes.push(RunNode {
                    run_id: run_id.to_string(),
                    agent_id: event.agent_id.clone(),
                    parent_run_id: None,
                    label: None,
                });
            }
        }

        // Runs that were never spawned explicitly still get a node
        let mut missing: Vec<(String, String)> = graph
            .run_agents
            .iter()
            .filter(|(run, _)| graph.node(run).is_none())
            .map(|(run, agent)| (run.clone(), agent.clone()))
            .collect();
        missing.sort();
        for (run_id, agent_id) in missing {
            graph.nodes.push(RunNode {
                run_id,
                agent_id,
                parent_run_id: None,
                label: None,
            });
        }

        for node in &mut graph.nodes {
            let Some(parent_agent) = parent_agents.get(&node.run_id) else {
                continue;
            };
            let parent_run = graph
                .agent_runs
                .get(parent_agent)
                .and_then(|runs| {
                    runs.iter()
                        .min_by_key(|r| graph.time_ranges.get(*r).map(|t| t.start))
                })
                .cloned();
            if let Some(parent_run) = parent_run {
                node.parent_run_id = Some(parent_run.clone());
                graph.edges.push(RunEdge {
                    from: parent_run,
                    to: node.run_id.clone(),
                });
            }
        }

        graph
    }
}
