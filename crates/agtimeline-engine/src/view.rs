use agtimeline_types::{EventRef, TimelineFilters};
use serde::{Deserialize, Serialize};

use crate::compress::{compress_lane, CompressionConfig, LaneItem};
use crate::filter::apply_filters;
use crate::index::TimelineIndex;
use crate::lane::{partition_lanes, Lane, LaneMode, RoomResolver};
use crate::replay::playback_sequence;
use crate::segment::{loaded_events, segment_events, Segment, DEFAULT_SEGMENT_WINDOW_MS};
use crate::virtual_window::should_virtualize;

/// Inputs of one full pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineViewOptions {
    pub filters: TimelineFilters,
    pub window_ms: i64,
    /// How many newest segments are currently loaded
    pub loaded_segments: usize,
    pub lane_mode: LaneMode,
    pub compression_enabled: bool,
    pub compression: CompressionConfig,
}

impl Default for TimelineViewOptions {
    fn default() -> Self {
        Self {
            filters: TimelineFilters::default(),
            window_ms: DEFAULT_SEGMENT_WINDOW_MS,
            loaded_segments: 3,
            lane_mode: LaneMode::default(),
            compression_enabled: true,
            compression: CompressionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneView {
    #[serde(flatten)]
    pub lane: Lane,
    pub items: Vec<LaneItem>,
    /// Item count exceeds the full-render threshold
    pub virtualized: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub total_events: usize,
    pub filtered_count: usize,
    /// All segments of the filtered sequence, newest first
    pub segments: Vec<Segment>,
    pub loaded_segment_count: usize,
    pub has_more_segments: bool,
    /// Events of the loaded segments, newest first
    pub loaded_events: Vec<EventRef>,
    pub lanes: Vec<LaneView>,
    /// Loaded events, oldest first
    pub playback: Vec<EventRef>,
}

impl TimelineView {
    pub fn lane(&self, key: &str) -> Option<&LaneView> {
        self.lanes.iter().find(|l| l.lane.key == key)
    }
}

/// Run index -> filter -> segment -> partition -> compress once, from scratch.
pub fn build_timeline_view(
    index: &TimelineIndex,
    options: &TimelineViewOptions,
    rooms: &dyn RoomResolver,
) -> TimelineView {
    let filtered = apply_filters(index, &options.filters);
    let segments = segment_events(&filtered, options.window_ms);
    let loaded_segment_count = options.loaded_segments.min(segments.len());
    let loaded = loaded_events(&segments, loaded_segment_count);

    let lanes = partition_lanes(&loaded, options.lane_mode, rooms)
        .into_iter()
        .map(|lane| {
            let items = compress_lane(
                &lane,
                options.compression_enabled,
                &options.compression,
                index.run_graph(),
            );
            LaneView {
                virtualized: should_virtualize(items.len()),
                lane,
                items,
            }
        })
        .collect();

    TimelineView {
        total_events: index.len(),
        filtered_count: filtered.len(),
        has_more_segments: loaded_segment_count < segments.len(),
        loaded_segment_count,
        playback: playback_sequence(&loaded),
        loaded_events: loaded,
        segments,
        lanes,
    }
}
