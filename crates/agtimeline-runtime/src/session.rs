use agtimeline_engine::{
    build_timeline_view, compute_virtual_window, next_replay_index, Direction,
    LaneItem, LaneMode, LoopRange, TimelineIndex, TimelineView, TimelineViewOptions, VirtualWindow,
};
use agtimeline_types::{EventRef, Snapshot, TimelineFilters};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::TimelineConfig;
use crate::loader::SegmentLoader;
use crate::{Error, Result};

/// Selection, loop bookmarks and play state of the replay controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayState {
    pub selected: Option<String>,
    /// Playback index of the selection; ids may repeat, positions do not
    pub position: Option<usize>,
    pub loop_range: Option<LoopRange>,
    pub playing: bool,
    pub direction: Direction,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self {
            selected: None,
            position: None,
            loop_range: None,
            playing: false,
            direction: Direction::Forward,
        }
    }
}

struct CachedView {
    snapshot: Arc<Snapshot>,
    generation: u64,
    options: TimelineViewOptions,
    view: Arc<TimelineView>,
}

/// Visible part of one lane after expansion and virtualization
#[derive(Debug, Clone)]
pub struct VisibleItems {
    pub window: VirtualWindow,
    pub virtualized: bool,
    pub items: Vec<LaneItem>,
}

/// Stateful owner of one dashboard timeline.
///
/// Holds the latest snapshot, the user's filters, lane mode, loaded segment
/// count, expansion and replay state. The derived view is recomputed lazily
/// and only when the snapshot or one of the view inputs changed.
pub struct TimelineSession {
    config: TimelineConfig,
    snapshot: Arc<Snapshot>,
    generation: u64,
    index: TimelineIndex,
    rooms: HashMap<String, String>,
    filters: TimelineFilters,
    lane_mode: LaneMode,
    compression_enabled: bool,
    loader: SegmentLoader,
    expanded: HashSet<String>,
    replay: ReplayState,
    cache: Option<CachedView>,
}

impl Default for TimelineSession {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

impl TimelineSession {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            loader: SegmentLoader::from_settings(&config.segments),
            compression_enabled: config.compression.enabled,
            snapshot: Arc::new(Snapshot::default()),
            generation: 0,
            index: TimelineIndex::default(),
            rooms: HashMap::new(),
            filters: TimelineFilters::default(),
            lane_mode: LaneMode::default(),
            expanded: HashSet::new(),
            replay: ReplayState::default(),
            cache: None,
            config,
        }
    }

    pub fn with_snapshot(config: TimelineConfig, snapshot: Snapshot) -> Self {
        let mut session = Self::new(config);
        session.replace_snapshot(snapshot);
        session
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Incremented on every snapshot replacement
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> &TimelineIndex {
        &self.index
    }

    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.replace_shared_snapshot(Arc::new(snapshot));
    }

    /// Install a snapshot that may also be held elsewhere (e.g. a poller cache).
    ///
    /// Installing the very same `Arc` again is a no-op.
    pub fn replace_shared_snapshot(&mut self, snapshot: Arc<Snapshot>) {
        if Arc::ptr_eq(&self.snapshot, &snapshot) {
            return;
        }

        let events: Vec<EventRef> = snapshot.events.iter().cloned().map(Arc::new).collect();
        self.index = TimelineIndex::build(&events, Arc::new(snapshot.run_graph_or_derived()));
        self.rooms = snapshot.room_assignments();
        self.snapshot = snapshot;
        self.generation += 1;

        info!(
            events = self.index.len(),
            runs = self.index.run_ids().count(),
            generation = self.generation,
            "snapshot replaced"
        );
    }

    pub fn filters(&self) -> &TimelineFilters {
        &self.filters
    }

    /// Changing filters drops back to the initial number of loaded segments
    pub fn set_filters(&mut self, filters: TimelineFilters) {
        if self.filters == filters {
            return;
        }
        debug!(?filters, "filters changed");
        self.filters = filters;
        self.loader.reset();
    }

    pub fn lane_mode(&self) -> LaneMode {
        self.lane_mode
    }

    pub fn set_lane_mode(&mut self, mode: LaneMode) {
        self.lane_mode = mode;
    }

    pub fn compression_enabled(&self) -> bool {
        self.compression_enabled
    }

    pub fn set_compression_enabled(&mut self, enabled: bool) {
        self.compression_enabled = enabled;
    }

    pub fn loader(&self) -> &SegmentLoader {
        &self.loader
    }

    /// Load older segments; returns the new loaded count
    pub fn load_more(&mut self) -> usize {
        self.loader.load_more()
    }

    pub fn view_options(&self) -> TimelineViewOptions {
        TimelineViewOptions {
            filters: self.filters.clone(),
            window_ms: self.config.segments.window_ms,
            loaded_segments: self.loader.loaded(),
            lane_mode: self.lane_mode,
            compression_enabled: self.compression_enabled,
            compression: self.config.compression.thresholds(),
        }
    }

    /// Current view, recomputed only when an input changed since the last call
    pub fn view(&mut self) -> Arc<TimelineView> {
        let options = self.view_options();

        if let Some(cache) = &self.cache
            && cache.generation == self.generation
            && Arc::ptr_eq(&cache.snapshot, &self.snapshot)
            && cache.options == options
        {
            return Arc::clone(&cache.view);
        }

        let view = Arc::new(build_timeline_view(&self.index, &options, &self.rooms));
        debug!(
            generation = self.generation,
            filtered = view.filtered_count,
            segments = view.segments.len(),
            loaded = view.loaded_events.len(),
            lanes = view.lanes.len(),
            "timeline recomputed"
        );

        self.reconcile(&view);
        self.cache = Some(CachedView {
            snapshot: Arc::clone(&self.snapshot),
            generation: self.generation,
            options,
            view: Arc::clone(&view),
        });
        view
    }

    /// Drop state that points at items the new view no longer has
    fn reconcile(&mut self, view: &TimelineView) {
        let summary_keys: HashSet<&str> = view
            .lanes
            .iter()
            .flat_map(|lane| lane.items.iter())
            .filter(|item| item.is_summary())
            .map(|item| item.key())
            .collect();
        let before = self.expanded.len();
        self.expanded.retain(|key| summary_keys.contains(key.as_str()));
        if self.expanded.len() != before {
            debug!(dropped = before - self.expanded.len(), "stale expansion keys dropped");
        }

        if let Some(selected) = &self.replay.selected {
            let still_there = self
                .replay
                .position
                .and_then(|i| view.playback.get(i))
                .is_some_and(|e| &e.id == selected);
            if !still_there {
                self.replay.position = view.playback.iter().position(|e| &e.id == selected);
                if self.replay.position.is_none() {
                    self.replay.selected = None;
                }
            }
        }

        if view.playback.is_empty() && self.replay.playing {
            info!("nothing loaded, playback stopped");
            self.replay.playing = false;
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Flip a summary between collapsed and expanded; returns the new state
    pub fn toggle_expanded(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_string());
            true
        }
    }

    pub fn expanded_keys(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    /// Lane items with every expanded summary replaced by its events
    pub fn render_items(&mut self, lane_key: &str) -> Vec<LaneItem> {
        let view = self.view();
        let Some(lane) = view.lane(lane_key) else {
            return Vec::new();
        };

        lane.items
            .iter()
            .cloned()
            .flat_map(|item| {
                if item.is_summary() && self.expanded.contains(item.key()) {
                    item.expand()
                } else {
                    vec![item]
                }
            })
            .collect()
    }

    /// Rendered slice of a lane for the given scroll position
    pub fn visible_items(
        &mut self,
        lane_key: &str,
        scroll_top: f64,
        container_height: f64,
    ) -> VisibleItems {
        let items = self.render_items(lane_key);
        let settings = &self.config.virtualization;

        if items.len() <= settings.threshold {
            return VisibleItems {
                window: VirtualWindow {
                    start_index: 0,
                    end_index: items.len(),
                    total_height: items.len() as f64 * settings.item_height.max(0.0),
                    offset_y: 0.0,
                },
                virtualized: false,
                items,
            };
        }

        let window = compute_virtual_window(
            items.len(),
            settings.item_height,
            container_height,
            scroll_top,
            settings.overscan,
        );
        VisibleItems {
            items: items[window.range()].to_vec(),
            virtualized: true,
            window,
        }
    }

    pub fn replay(&self) -> &ReplayState {
        &self.replay
    }

    pub fn selected(&self) -> Option<&str> {
        self.replay.selected.as_deref()
    }

    /// Select a loaded event; unknown ids leave the selection unchanged.
    /// A repeated id selects its oldest copy.
    pub fn select(&mut self, id: &str) -> bool {
        let view = self.view();
        match view.playback.iter().position(|e| e.id == id) {
            Some(index) => {
                self.select_position(&view, index);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.replay.selected = None;
        self.replay.position = None;
    }

    fn select_position(&mut self, view: &TimelineView, index: usize) -> Option<String> {
        let event = view.playback.get(index)?;
        self.replay.selected = Some(event.id.clone());
        self.replay.position = Some(index);
        Some(event.id.clone())
    }

    /// Bookmark a loop between two playback positions, in either order
    pub fn set_loop(&mut self, a: usize, b: usize) {
        self.replay.loop_range = Some(LoopRange::normalized(a, b));
    }

    /// Bookmark a loop between two loaded events
    pub fn set_loop_between(&mut self, a_id: &str, b_id: &str) -> Result<()> {
        let view = self.view();
        let position = |id: &str| {
            view.playback
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| Error::InvalidOperation(format!("event {} is not loaded", id)))
        };
        let (a, b) = (position(a_id)?, position(b_id)?);
        self.set_loop(a, b);
        Ok(())
    }

    pub fn clear_loop(&mut self) {
        self.replay.loop_range = None;
    }

    /// Move the selection one event along the playback sequence.
    ///
    /// Without a selection, forward starts at the oldest event and backward
    /// at the newest. Stepping off either end keeps the current selection.
    pub fn step(&mut self, direction: Direction) -> Option<String> {
        let view = self.view();
        let next = match self.replay.position {
            Some(current) => current
                .checked_add_signed(direction.delta())
                .filter(|next| *next < view.playback.len()),
            None => match direction {
                Direction::Forward => (!view.playback.is_empty()).then_some(0),
                Direction::Backward => view.playback.len().checked_sub(1),
            },
        }?;
        self.select_position(&view, next)
    }

    /// Start playback; false when nothing is loaded
    pub fn play(&mut self, direction: Direction) -> bool {
        let view = self.view();
        if view.playback.is_empty() {
            return false;
        }
        self.replay.direction = direction;
        self.replay.playing = true;
        true
    }

    pub fn pause(&mut self) {
        self.replay.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.replay.playing
    }

    /// Advance playback by one timer tick; None means playback stopped
    pub fn tick(&mut self) -> Option<String> {
        if !self.replay.playing {
            return None;
        }

        let view = self.view();
        let current = self.replay.position;

        let next = match (current, self.replay.direction, self.replay.loop_range) {
            // Reverse playback with nothing selected starts at the newest event
            (None, Direction::Backward, None) => view.playback.len().checked_sub(1),
            _ => next_replay_index(
                current,
                view.playback.len(),
                self.replay.direction,
                self.replay.loop_range,
            ),
        };

        match next.and_then(|index| self.select_position(&view, index)) {
            Some(id) => Some(id),
            None => {
                debug!("end of playback sequence");
                self.replay.playing = false;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agtimeline_testing::{fixtures, EventBuilder};
    use agtimeline_types::StatusFilter;

    const CODER_BURST: &str = "run-burst:ev-10:ev-03";

    fn session() -> TimelineSession {
        TimelineSession::with_snapshot(TimelineConfig::default(), fixtures::sample_snapshot())
    }

    #[test]
    fn test_view_is_memoized_until_an_input_changes() {
        let mut session = session();
        let first = session.view();
        let second = session.view();
        assert!(Arc::ptr_eq(&first, &second));

        session.set_lane_mode(LaneMode::Room);
        let third = session.view();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.lanes[0].lane.key, "room:ops");
    }

    #[test]
    fn test_replacing_snapshot_recomputes() {
        let mut session = session();
        let before = session.view();

        session.replace_snapshot(fixtures::sample_snapshot());
        let after = session.view();

        assert_eq!(session.generation(), 2);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.total_events, 11);
    }

    #[test]
    fn test_same_shared_snapshot_is_ignored() {
        let shared = Arc::new(fixtures::sample_snapshot());
        let mut session = TimelineSession::default();
        session.replace_shared_snapshot(Arc::clone(&shared));
        session.replace_shared_snapshot(shared);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_filter_change_resets_loaded_segments() {
        let mut session = session();
        assert_eq!(session.load_more(), 5);

        session.set_filters(TimelineFilters {
            status: StatusFilter::Error,
            ..Default::default()
        });

        assert_eq!(session.loader().loaded(), 3);
        assert_eq!(session.view().filtered_count, 1);
    }

    #[test]
    fn test_expanded_summary_renders_its_events() {
        let mut session = session();
        assert_eq!(session.render_items("agent:coder").len(), 1);

        assert!(session.toggle_expanded(CODER_BURST));
        let items = session.render_items("agent:coder");
        let keys: Vec<&str> = items.iter().map(|i| i.key()).collect();
        assert_eq!(
            keys,
            vec!["event:ev-10", "event:ev-09", "event:ev-05", "event:ev-04", "event:ev-03"]
        );

        assert!(!session.toggle_expanded(CODER_BURST));
        assert_eq!(session.render_items("agent:coder").len(), 1);
    }

    #[test]
    fn test_expansion_survives_unchanged_data_and_drops_stale_keys() {
        let mut session = session();
        session.toggle_expanded(CODER_BURST);

        session.replace_snapshot(fixtures::sample_snapshot());
        session.view();
        assert!(session.is_expanded(CODER_BURST));

        let mut trimmed = fixtures::sample_snapshot();
        trimmed.events.retain(|e| e.id != "ev-10");
        session.replace_snapshot(trimmed);
        session.view();
        assert!(!session.is_expanded(CODER_BURST));
        assert_eq!(session.expanded_keys().count(), 0);
    }

    #[test]
    fn test_unknown_lane_renders_nothing() {
        let mut session = session();
        assert!(session.render_items("agent:nobody").is_empty());
    }

    #[test]
    fn test_small_lane_is_not_virtualized() {
        let mut session = session();
        let visible = session.visible_items("agent:planner", 0.0, 100.0);
        assert!(!visible.virtualized);
        assert_eq!(visible.items.len(), 3);
        assert_eq!(visible.window.total_height, 216.0);
    }

    #[test]
    fn test_large_lane_is_virtualized() {
        let mut config = TimelineConfig::default();
        config.virtualization.threshold = 2;
        config.compression.enabled = false;
        let mut session = TimelineSession::with_snapshot(config, fixtures::sample_snapshot());

        let visible = session.visible_items("agent:coder", 0.0, 72.0);
        assert!(visible.virtualized);
        assert_eq!(visible.window.range(), 0..4);
        assert_eq!(visible.items.len(), 4);
    }

    #[test]
    fn test_step_walks_playback_order() {
        let mut session = session();
        assert_eq!(session.step(Direction::Forward).as_deref(), Some("ev-01"));
        assert_eq!(session.step(Direction::Forward).as_deref(), Some("ev-02"));
        assert_eq!(session.step(Direction::Backward).as_deref(), Some("ev-01"));
        assert_eq!(session.step(Direction::Backward), None);
        assert_eq!(session.selected(), Some("ev-01"));
    }

    #[test]
    fn test_tick_wraps_inside_loop() {
        let mut session = session();
        assert!(session.select("ev-02"));
        session.set_loop_between("ev-05", "ev-03").unwrap();
        assert_eq!(session.replay().loop_range, Some(LoopRange { start: 2, end: 4 }));

        assert!(session.play(Direction::Forward));
        let visited: Vec<String> = (0..5).filter_map(|_| session.tick()).collect();
        assert_eq!(visited, vec!["ev-03", "ev-04", "ev-05", "ev-03", "ev-04"]);
        assert!(session.is_playing());
    }

    #[test]
    fn test_tick_past_end_stops_playback() {
        let mut session = session();
        session.select("ev-10");
        session.play(Direction::Forward);

        assert_eq!(session.tick().as_deref(), Some("ev-11"));
        assert_eq!(session.tick(), None);
        assert!(!session.is_playing());
        assert_eq!(session.selected(), Some("ev-11"));
    }

    #[test]
    fn test_reverse_playback_starts_at_newest() {
        let mut session = session();
        session.play(Direction::Backward);

        assert_eq!(session.tick().as_deref(), Some("ev-11"));
        assert_eq!(session.tick().as_deref(), Some("ev-10"));
    }

    #[test]
    fn test_repeated_ids_do_not_trap_playback() {
        let snapshot = Snapshot {
            events: vec![
                EventBuilder::start("a", 10).id("dup").build(),
                EventBuilder::start("a", 10).id("dup").build(),
                EventBuilder::start("a", 20).id("x").build(),
            ],
            ..Default::default()
        };
        let mut session = TimelineSession::with_snapshot(TimelineConfig::default(), snapshot);
        assert!(session.play(Direction::Forward));

        let visited: Vec<String> = (0..8).map_while(|_| session.tick()).collect();
        assert_eq!(visited, vec!["dup", "dup", "x"]);
        assert!(!session.is_playing());
        assert_eq!(session.replay().position, Some(2));

        assert_eq!(session.step(Direction::Backward).as_deref(), Some("dup"));
        assert_eq!(session.replay().position, Some(1));
    }

    #[test]
    fn test_selection_follows_event_across_snapshot_replacement() {
        let mut session = session();
        session.select("ev-05");
        assert_eq!(session.replay().position, Some(4));

        let mut trimmed = fixtures::sample_snapshot();
        trimmed.events.retain(|e| e.id != "ev-01");
        session.replace_snapshot(trimmed);
        session.view();

        assert_eq!(session.selected(), Some("ev-05"));
        assert_eq!(session.replay().position, Some(3));
    }

    #[test]
    fn test_loop_with_unloaded_event_is_rejected() {
        let mut session = session();
        let err = session.set_loop_between("ev-01", "missing").unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
        assert!(session.replay().loop_range.is_none());
    }

    #[test]
    fn test_empty_session_cannot_play() {
        let mut session = TimelineSession::default();
        assert!(!session.play(Direction::Forward));
        assert_eq!(session.tick(), None);
        assert!(!session.select("ev-01"));
    }

    #[test]
    fn test_filtering_everything_out_stops_playback() {
        let mut session = session();
        session.play(Direction::Forward);
        session.tick();

        session.set_filters(TimelineFilters {
            agent_id: "nobody".to_string(),
            ..Default::default()
        });
        session.view();

        assert!(!session.is_playing());
        assert_eq!(session.selected(), None);
    }
}
