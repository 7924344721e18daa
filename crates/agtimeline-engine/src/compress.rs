use agtimeline_types::{EventRef, RunGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::lane::Lane;

// NOTE: Burst Compression
//
// A lane is scanned newest-first and consecutive events are folded into one
// summary item when either rule fires:
//
// - run-burst:    >= run_burst_threshold consecutive events share a run id
// - dense-window: >= dense_threshold consecutive events fit inside
//                 dense_window_ms (max(at) - min(at) of the group)
//
// Run bursts are checked first at each position. Summaries keep every event
// they fold, and keys derive from the group's boundary event ids so that
// caller-held expansion state survives recomputation on unchanged data.

/// Thresholds for burst compression; all three are tunable via configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub run_burst_threshold: usize,
    pub dense_threshold: usize,
    pub dense_window_ms: i64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            run_burst_threshold: 4,
            dense_threshold: 6,
            dense_window_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryKind {
    RunBurst,
    DenseWindow,
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::RunBurst => "run-burst",
            SummaryKind::DenseWindow => "dense-window",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneSummary {
    pub key: String,
    pub summary_kind: SummaryKind,
    pub label: String,
    pub event_count: usize,
    pub run_count: usize,
    pub latest_at: i64,
    /// Every folded event, newest first, kept for expansion
    pub events: Vec<EventRef>,
}

/// Unit rendered inside a lane after compression
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LaneItem {
    Event { key: String, event: EventRef },
    Summary(LaneSummary),
}

impl LaneItem {
    pub fn event(event: EventRef) -> Self {
        LaneItem::Event {
            key: event_key(&event),
            event,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            LaneItem::Event { key, .. } => key,
            LaneItem::Summary(summary) => &summary.key,
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, LaneItem::Summary(_))
    }

    pub fn latest_at(&self) -> i64 {
        match self {
            LaneItem::Event { event, .. } => event.at,
            LaneItem::Summary(summary) => summary.latest_at,
        }
    }

    /// Underlying events in lane order
    pub fn events(&self) -> &[EventRef] {
        match self {
            LaneItem::Event { event, .. } => std::slice::from_ref(event),
            LaneItem::Summary(summary) => &summary.events,
        }
    }

    /// Replace a summary with one event item per folded event
    pub fn expand(self) -> Vec<LaneItem> {
        match self {
            item @ LaneItem::Event { .. } => vec![item],
            LaneItem::Summary(summary) => summary.events.into_iter().map(LaneItem::event).collect(),
        }
    }
}

/// 1 for an event item, the group size for a summary
pub fn lane_item_event_count(item: &LaneItem) -> usize {
    match item {
        LaneItem::Event { .. } => 1,
        LaneItem::Summary(summary) => summary.event_count,
    }
}

pub fn compress_lane(
    lane: &Lane,
    enabled: bool,
    config: &CompressionConfig,
    runs: &RunGraph,
) -> Vec<LaneItem> {
    compress_events(&lane.events, enabled, config, runs)
}

/// Compress a newest-first event list; with `enabled == false` every event becomes its own item.
///
/// Run-burst labels name the run through `runs`.
pub fn compress_events(
    events: &[EventRef],
    enabled: bool,
    config: &CompressionConfig,
    runs: &RunGraph,
) -> Vec<LaneItem> {
    if !enabled {
        return events.iter().cloned().map(LaneItem::event).collect();
    }

    // A "group" of one is never a summary
    let run_threshold = config.run_burst_threshold.max(2);
    let dense_threshold = config.dense_threshold.max(2);
    let window_ms = config.dense_window_ms.max(0);

    let mut items = Vec::new();
    let mut i = 0;
    while i < events.len() {
        let run_end = run_burst_end(events, i);
        if run_end - i >= run_threshold {
            items.push(summarize(SummaryKind::RunBurst, &events[i..run_end], runs));
            i = run_end;
            continue;
        }

        let dense_end = dense_window_end(events, i, window_ms);
        if dense_end - i >= dense_threshold {
            items.push(summarize(SummaryKind::DenseWindow, &events[i..dense_end], runs));
            i = dense_end;
            continue;
        }

        items.push(LaneItem::event(events[i].clone()));
        i += 1;
    }

    items
}

fn run_burst_end(events: &[EventRef], start: usize) -> usize {
    let Some(run_id) = events[start].run_id() else {
        return start + 1;
    };
    events[start..]
        .iter()
        .position(|e| e.run_id() != Some(run_id))
        .map_or(events.len(), |offset| start + offset)
}

fn dense_window_end(events: &[EventRef], start: usize, window_ms: i64) -> usize {
    let mut min_at = events[start].at;
    let mut max_at = events[start].at;
    let mut end = start + 1;

    while let Some(next) = events.get(end) {
        let lo = min_at.min(next.at);
        let hi = max_at.max(next.at);
        if hi.saturating_sub(lo) > window_ms {
            break;
        }
        min_at = lo;
        max_at = hi;
        end += 1;
    }

    end
}

fn summarize(kind: SummaryKind, group: &[EventRef], runs: &RunGraph) -> LaneItem {
    let first = &group[0];
    let last = &group[group.len() - 1];
    let latest_at = group.iter().map(|e| e.at).max().unwrap_or(first.at);
    let earliest_at = group.iter().map(|e| e.at).min().unwrap_or(first.at);
    let run_ids: HashSet<&str> = group.iter().filter_map(|e| e.run_id()).collect();

    let label = match kind {
        SummaryKind::RunBurst => format!(
            "{} events in run {}",
            group.len(),
            runs.run_label(first.run_id().unwrap_or_default())
        ),
        SummaryKind::DenseWindow => {
            let span_secs = latest_at.saturating_sub(earliest_at) / 1_000;
            if run_ids.len() > 1 {
                format!(
                    "{} events in {}s across {} runs",
                    group.len(),
                    span_secs,
                    run_ids.len()
                )
            } else {
                format!("{} events in {}s", group.len(), span_secs)
            }
        }
    };

    LaneItem::Summary(LaneSummary {
        key: format!("{}:{}:{}", kind.as_str(), first.id, last.id),
        summary_kind: kind,
        label,
        event_count: group.len(),
        run_count: run_ids.len(),
        latest_at,
        events: group.to_vec(),
    })
}

fn event_key(event: &EventRef) -> String {
    format!("event:{}", event.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agtimeline_testing::EventBuilder;
    use agtimeline_types::RunNode;
    use std::sync::Arc;

    fn ev(id: &str, run: Option<&str>, at: i64) -> EventRef {
        let builder = EventBuilder::start("agent", at).id(id);
        Arc::new(match run {
            Some(run) => builder.run(run).build(),
            None => builder.build(),
        })
    }

    fn compress(events: &[EventRef], enabled: bool, config: &CompressionConfig) -> Vec<LaneItem> {
        compress_events(events, enabled, config, &RunGraph::default())
    }

    fn total(items: &[LaneItem]) -> usize {
        items.iter().map(lane_item_event_count).sum()
    }

    #[test]
    fn test_disabled_returns_one_item_per_event() {
        let events: Vec<EventRef> = (0..5).map(|i| ev(&i.to_string(), Some("r1"), 100 - i)).collect();

        let items = compress(&events, false, &CompressionConfig::default());

        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| !i.is_summary()));
        assert_eq!(items[0].key(), "event:0");
    }

    #[test]
    fn test_five_same_run_events_become_one_run_burst() {
        let events: Vec<EventRef> = (0..5)
            .map(|i| ev(&format!("e{}", i), Some("r1"), 1_000_000 - i * 120_000))
            .collect();

        let items = compress(&events, true, &CompressionConfig::default());

        assert_eq!(items.len(), 1);
        match &items[0] {
            LaneItem::Summary(summary) => {
                assert_eq!(summary.summary_kind, SummaryKind::RunBurst);
                assert_eq!(summary.event_count, 5);
                assert_eq!(summary.run_count, 1);
                assert_eq!(summary.latest_at, 1_000_000);
                assert_eq!(summary.key, "run-burst:e0:e4");
                assert_eq!(summary.label, "5 events in run r1");
            }
            other => panic!("expected summary, got {:?}", other),
        }
    }

    #[test]
    fn test_run_burst_label_comes_from_run_graph() {
        let events: Vec<EventRef> = (0..4)
            .map(|i| ev(&format!("e{}", i), Some("r1"), 1_000_000 - i * 120_000))
            .collect();
        let labelled = RunGraph {
            nodes: vec![RunNode {
                run_id: "r1".to_string(),
                agent_id: "agent".to_string(),
                parent_run_id: None,
                label: Some("nightly build".to_string()),
            }],
            ..Default::default()
        };
        let mut by_agent = RunGraph::default();
        by_agent
            .run_agents
            .insert("r1".to_string(), "agent".to_string());

        let label = |runs: &RunGraph| {
            let items = compress_events(&events, true, &CompressionConfig::default(), runs);
            match &items[0] {
                LaneItem::Summary(summary) => summary.label.clone(),
                other => panic!("expected summary, got {:?}", other),
            }
        };

        assert_eq!(label(&labelled), "4 events in run nightly build");
        assert_eq!(label(&by_agent), "4 events in run agent/r1");
    }

    #[test]
    fn test_dense_window_label_survives_extreme_timestamps() {
        let events: Vec<EventRef> = (0..6)
            .map(|i| {
                let at = if i % 2 == 0 { i64::MAX } else { i64::MIN };
                ev(&format!("x{}", i), None, at)
            })
            .collect();
        let config = CompressionConfig {
            dense_window_ms: i64::MAX,
            ..Default::default()
        };

        let items = compress(&events, true, &config);

        assert_eq!(items.len(), 1);
        assert!(items[0].is_summary());
    }

    #[test]
    fn test_run_burst_below_threshold_stays_individual() {
        let events = vec![
            ev("1", Some("r1"), 900_000),
            ev("2", Some("r1"), 600_000),
            ev("3", Some("r1"), 300_000),
            ev("4", Some("r2"), 0),
        ];

        let items = compress(&events, true, &CompressionConfig::default());
        assert_eq!(items.len(), 4);
        assert_eq!(total(&items), 4);
    }

    #[test]
    fn test_dense_window_across_runs() {
        let events: Vec<EventRef> = (0..6)
            .map(|i| ev(&format!("d{}", i), Some(format!("r{}", i % 2).as_str()), 50_000 - i * 5_000))
            .collect();

        let items = compress(&events, true, &CompressionConfig::default());

        assert_eq!(items.len(), 1);
        match &items[0] {
            LaneItem::Summary(summary) => {
                assert_eq!(summary.summary_kind, SummaryKind::DenseWindow);
                assert_eq!(summary.event_count, 6);
                assert_eq!(summary.run_count, 2);
                assert_eq!(summary.label, "6 events in 25s across 2 runs");
            }
            other => panic!("expected summary, got {:?}", other),
        }
    }

    #[test]
    fn test_dense_window_respects_span() {
        // Six events spread over 50s never fit a 30s window
        let events: Vec<EventRef> = (0..6)
            .map(|i| ev(&i.to_string(), None, 50_000 - i * 10_000))
            .collect();

        let items = compress(&events, true, &CompressionConfig::default());
        assert_eq!(items.len(), 6);
    }

    #[test]
    fn test_mixed_lane_conserves_events() {
        let mut events = vec![ev("lone", None, 10_000_000)];
        events.extend((0..4).map(|i| ev(&format!("b{}", i), Some("r9"), 9_000_000 - i * 100_000)));
        events.extend((0..7).map(|i| ev(&format!("d{}", i), None, 5_000_000 - i * 1_000)));
        events.push(ev("tail", Some("r1"), 0));

        let items = compress(&events, true, &CompressionConfig::default());
        let kinds: Vec<&str> = items
            .iter()
            .map(|i| match i {
                LaneItem::Event { .. } => "event",
                LaneItem::Summary(s) => s.summary_kind.as_str(),
            })
            .collect();

        assert_eq!(kinds, vec!["event", "run-burst", "dense-window", "event"]);
        assert_eq!(total(&items), events.len());

        let flattened: Vec<&str> = items
            .iter()
            .flat_map(|i| i.events().iter().map(|e| e.id.as_str()))
            .collect();
        let original: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_keys_stable_across_recomputation() {
        let events: Vec<EventRef> = (0..8)
            .map(|i| ev(&format!("k{}", i), Some("r1"), 80_000 - i * 1_000))
            .collect();
        let config = CompressionConfig::default();

        let first: Vec<String> = compress(&events, true, &config)
            .iter()
            .map(|i| i.key().to_string())
            .collect();
        let second: Vec<String> = compress(&events, true, &config)
            .iter()
            .map(|i| i.key().to_string())
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_thresholds() {
        let events = vec![ev("1", Some("r1"), 2), ev("2", Some("r1"), 1)];
        let config = CompressionConfig {
            run_burst_threshold: 2,
            ..Default::default()
        };

        let items = compress(&events, true, &config);
        assert_eq!(items.len(), 1);
        assert!(items[0].is_summary());
    }

    #[test]
    fn test_expand_restores_event_items() {
        let events: Vec<EventRef> = (0..4)
            .map(|i| ev(&format!("x{}", i), Some("r1"), 4 - i))
            .collect();

        let items = compress(&events, true, &CompressionConfig::default());
        let expanded: Vec<LaneItem> = items.into_iter().flat_map(LaneItem::expand).collect();

        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[3].key(), "event:x3");
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let events: Vec<EventRef> = (0..4)
            .map(|i| ev(&format!("s{}", i), Some("r1"), 4 - i))
            .collect();
        let items = compress(&events, true, &CompressionConfig::default());

        let value = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(value["kind"], "summary");
        assert_eq!(value["summaryKind"], "run-burst");
        assert_eq!(value["eventCount"], 4);
        assert_eq!(value["events"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn test_empty_lane() {
        assert!(compress(&[], true, &CompressionConfig::default()).is_empty());
    }
}
