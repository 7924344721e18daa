use agtimeline_runtime::TimelineSession;
use anyhow::Result;
use std::path::Path;

use super::HandlerContext;
use crate::args::FilterArgs;
use crate::presentation::SegmentsViewModel;

pub fn handle(
    ctx: &HandlerContext,
    snapshot_path: &Path,
    filters: &FilterArgs,
    window_ms: Option<i64>,
    loaded: Option<usize>,
) -> Result<()> {
    let snapshot = ctx.load_snapshot(snapshot_path)?;

    let mut config = ctx.config.clone();
    if let Some(window_ms) = window_ms {
        config.segments.window_ms = window_ms;
    }
    if let Some(loaded) = loaded {
        config.segments.initial_loaded = loaded;
    }

    let mut session = TimelineSession::with_snapshot(config, snapshot);
    session.set_filters(filters.to_filters());
    let view = session.view();

    ctx.render(SegmentsViewModel::from_view(
        &view,
        session.config().segments.window_ms,
    ))
}
