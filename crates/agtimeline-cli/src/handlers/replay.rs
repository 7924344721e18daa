use agtimeline_engine::Direction;
use agtimeline_runtime::{run_playback, TimelineSession};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;

use super::HandlerContext;
use crate::args::FilterArgs;
use crate::presentation::ReplayViewModel;

pub struct ReplayOptions {
    pub from: Option<String>,
    pub loop_bounds: Option<(usize, usize)>,
    pub ticks: Option<usize>,
    pub direction: Direction,
    pub tick_ms: Option<u64>,
    pub loaded: Option<usize>,
}

pub fn handle(
    ctx: &HandlerContext,
    snapshot_path: &Path,
    filters: &FilterArgs,
    options: ReplayOptions,
) -> Result<()> {
    let snapshot = ctx.load_snapshot(snapshot_path)?;

    let mut config = ctx.config.clone();
    if let Some(loaded) = options.loaded {
        config.segments.initial_loaded = loaded;
    }
    let tick_ms = options.tick_ms.unwrap_or(config.replay.tick_ms);

    let mut session = TimelineSession::with_snapshot(config, snapshot);
    session.set_filters(filters.to_filters());

    if let Some(id) = &options.from
        && !session.select(id)
    {
        bail!("event {} is not among the loaded events", id);
    }

    // A loop never ends on its own; default to one pass through it
    let ticks = match (options.loop_bounds, options.ticks) {
        (Some((start, end)), None) => Some(start.abs_diff(end) + 1),
        (_, ticks) => ticks,
    };
    if let Some((start, end)) = options.loop_bounds {
        session.set_loop(start, end);
    }

    let playback_len = session.view().playback.len();
    let mut visited = Vec::new();

    if session.play(options.direction) {
        if tick_ms == 0 {
            while ticks.is_none_or(|max| visited.len() < max) {
                match session.tick() {
                    Some(id) => visited.push(id),
                    None => break,
                }
            }
        } else {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("failed to start playback timer")?;
            runtime.block_on(run_playback(
                &mut session,
                Duration::from_millis(tick_ms),
                ticks,
                |id| visited.push(id.to_string()),
            ));
        }
    }

    let stopped = !session.is_playing() && ticks.is_none_or(|max| visited.len() < max);

    ctx.render(ReplayViewModel {
        direction: options.direction,
        from: options.from,
        loop_range: session.replay().loop_range,
        playback_len,
        visited,
        stopped,
    })
}
