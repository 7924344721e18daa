use agtimeline_types::{EventRef, RunGraph, TimelineEvent};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup indices over one snapshot of the event log.
///
/// Rebuilt from scratch whenever the events or the run graph change; never
/// patched incrementally. `descending` keeps every raw log position (duplicate
/// ids included), while `by_id` keeps the last event seen for each id.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    events: Vec<EventRef>,
    by_id: HashMap<String, EventRef>,
    by_run_id: IndexMap<String, IndexSet<String>>,
    descending: Vec<EventRef>,
    run_graph: Arc<RunGraph>,
}

impl TimelineIndex {
    /// Build indices over `events` (in arrival order) and the supplied run graph.
    pub fn build(events: &[EventRef], run_graph: Arc<RunGraph>) -> Self {
        let mut by_id = HashMap::with_capacity(events.len());
        let mut by_run_id: IndexMap<String, IndexSet<String>> = IndexMap::new();

        for event in events {
            // Last write wins for duplicate ids
            by_id.insert(event.id.clone(), Arc::clone(event));

            if let Some(run_id) = event.run_id() {
                by_run_id
                    .entry(run_id.to_string())
                    .or_default()
                    .insert(event.id.clone());
            }
        }

        let mut descending = events.to_vec();
        // Stable: equal timestamps keep arrival order
        descending.sort_by(|a, b| b.at.cmp(&a.at));

        Self {
            events: events.to_vec(),
            by_id,
            by_run_id,
            descending,
            run_graph,
        }
    }

    pub fn from_events(events: Vec<TimelineEvent>, run_graph: RunGraph) -> Self {
        let events: Vec<EventRef> = events.into_iter().map(Arc::new).collect();
        Self::build(&events, Arc::new(run_graph))
    }

    pub fn get(&self, id: &str) -> Option<&EventRef> {
        self.by_id.get(id)
    }

    /// Event ids of a run in arrival order
    pub fn run_event_ids(&self, run_id: &str) -> Option<&IndexSet<String>> {
        self.by_run_id.get(run_id)
    }

    pub fn run_events(&self, run_id: &str) -> Vec<EventRef> {
        self.run_event_ids(run_id)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).cloned().collect())
            .unwrap_or_default()
    }

    /// Run ids in order of first arrival
    pub fn run_ids(&self) -> impl Iterator<Item = &str> {
        self.by_run_id.keys().map(String::as_str)
    }

    /// All events, newest first
    pub fn descending(&self) -> &[EventRef] {
        &self.descending
    }

    /// All events in arrival order
    pub fn events(&self) -> &[EventRef] {
        &self.events
    }

    pub fn run_graph(&self) -> &RunGraph {
        &self.run_graph
    }

    pub fn len(&self) -> usize {
        self.descending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descending.is_empty()
    }

    /// Number of distinct event ids
    pub fn unique_len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agtimeline_testing::EventBuilder;

    #[test]
    fn test_descending_breaks_ties_by_arrival() {
        let events = vec![
            EventBuilder::start("a", 100).id("first").build(),
            EventBuilder::start("b", 300).id("newest").build(),
            EventBuilder::start("c", 100).id("second").build(),
        ];

        let index = TimelineIndex::from_events(events, RunGraph::default());
        let ids: Vec<&str> = index.descending().iter().map(|e| e.id.as_str()).collect();

        assert_eq!(ids, vec!["newest", "first", "second"]);
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let events = vec![
            EventBuilder::start("a", 1).id("dup").text("old").build(),
            EventBuilder::complete("a", 2).id("dup").text("new").build(),
        ];

        let index = TimelineIndex::from_events(events, RunGraph::default());

        assert_eq!(index.len(), 2);
        assert_eq!(index.unique_len(), 1);
        assert_eq!(index.get("dup").map(|e| e.text.as_str()), Some("new"));
    }

    #[test]
    fn test_by_run_id_keeps_arrival_order() {
        let events = vec![
            EventBuilder::start("a", 50).id("x").run("r1").build(),
            EventBuilder::start("a", 10).id("y").run("r1").build(),
            EventBuilder::start("b", 20).id("z").run("r2").build(),
            EventBuilder::start("b", 30).id("orphan").build(),
        ];

        let index = TimelineIndex::from_events(events, RunGraph::default());

        let r1: Vec<&str> = index
            .run_event_ids("r1")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(r1, vec!["x", "y"]);
        assert_eq!(index.run_ids().collect::<Vec<_>>(), vec!["r1", "r2"]);
        assert!(index.get("orphan").is_some());
        assert_eq!(index.run_events("r2").len(), 1);
        assert!(index.run_events("missing").is_empty());
    }

    #[test]
    fn test_empty_log() {
        let index = TimelineIndex::from_events(Vec::new(), RunGraph::default());
        assert!(index.is_empty());
        assert_eq!(index.unique_len(), 0);
        assert!(index.descending().is_empty());
    }
}
