use agtimeline_engine::LaneMode;
use agtimeline_runtime::TimelineSession;
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

use super::HandlerContext;
use crate::args::FilterArgs;
use crate::presentation::{ItemRow, LaneRow, LanesViewModel};

pub struct LanesOptions<'a> {
    pub mode: LaneMode,
    pub compress: bool,
    pub expand: &'a [String],
    pub loaded: Option<usize>,
    pub window_ms: Option<i64>,
}

pub fn handle(
    ctx: &HandlerContext,
    snapshot_path: &Path,
    filters: &FilterArgs,
    options: LanesOptions<'_>,
) -> Result<()> {
    let snapshot = ctx.load_snapshot(snapshot_path)?;

    let mut config = ctx.config.clone();
    if let Some(window_ms) = options.window_ms {
        config.segments.window_ms = window_ms;
    }
    if let Some(loaded) = options.loaded {
        config.segments.initial_loaded = loaded;
    }

    let mut session = TimelineSession::with_snapshot(config, snapshot);
    session.set_filters(filters.to_filters());
    session.set_lane_mode(options.mode);
    if !options.compress {
        session.set_compression_enabled(false);
    }

    let view = session.view();
    let summary_keys: HashSet<&str> = view
        .lanes
        .iter()
        .flat_map(|lane| lane.items.iter())
        .filter(|item| item.is_summary())
        .map(|item| item.key())
        .collect();
    for key in options.expand {
        if !summary_keys.contains(key.as_str()) {
            warn!(key = %key, "no summary with this key; nothing expanded");
        } else if !session.is_expanded(key) {
            session.toggle_expanded(key);
        }
    }

    let mut lanes = Vec::with_capacity(view.lanes.len());
    for lane_view in &view.lanes {
        let lane = &lane_view.lane;
        let items = session.render_items(&lane.key);
        lanes.push(LaneRow {
            key: lane.key.clone(),
            label: lane.label.clone(),
            parent_id: lane.parent_id.clone(),
            event_count: lane.event_count,
            run_count: lane.run_count,
            density_per_minute: lane.density_per_minute,
            virtualized: items.len() > session.config().virtualization.threshold,
            items: items.iter().map(ItemRow::from).collect(),
        });
    }

    ctx.render(LanesViewModel {
        mode: options.mode,
        loaded_events: view.loaded_events.len(),
        lanes,
    })
}
