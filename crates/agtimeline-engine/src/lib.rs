// NOTE: Timeline Engine Rationale
//
// Why recompute from scratch (not incremental)?
// - Snapshots replace the whole log; ordering/dedup across partial updates is not guaranteed
// - Every stage is a pure function of its inputs, so results are trivially reproducible
// - Callers memoize by input identity (Arc::ptr_eq / generation) instead of patching state
//
// Why Arc<TimelineEvent> (not owned copies)?
// - Index, segments, lanes and summaries all reference the same events
// - Reordering and grouping never clones payloads
//
// Why no errors in this crate?
// - All operations are total over typed input; empty input yields empty output
// - "End of sequence" in replay is a steady state expressed as None, not a failure

pub mod compress;
pub mod filter;
pub mod index;
pub mod lane;
pub mod replay;
pub mod segment;
pub mod view;
pub mod virtual_window;

pub use compress::{
    compress_events, compress_lane, lane_item_event_count, CompressionConfig, LaneItem,
    LaneSummary, SummaryKind,
};
pub use filter::apply_filters;
pub use index::TimelineIndex;
pub use lane::{
    density_per_minute, partition_lanes, Lane, LaneMode, NoRooms, RoomResolver,
    UNASSIGNED_LANE_ID,
};
pub use replay::{next_adjacent_id, next_replay_index, playback_sequence, Direction, LoopRange};
pub use segment::{loaded_events, segment_events, Segment, DEFAULT_SEGMENT_WINDOW_MS};
pub use view::{build_timeline_view, LaneView, TimelineView, TimelineViewOptions};
pub use virtual_window::{
    compute_virtual_window, should_virtualize, VirtualWindow, DEFAULT_OVERSCAN,
    VIRTUALIZATION_THRESHOLD,
};
