use agtimeline_engine::Direction;
use agtimeline_runtime::{resolve_config_path, TimelineConfig};
use anyhow::{Context, Result};
use tracing::debug;

use super::args::{Cli, Commands};
use super::handlers::{self, HandlerContext};
use crate::logging::init_logging;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level);

    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = TimelineConfig::load_from(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    debug!(path = %config_path.display(), "config loaded");

    let ctx = HandlerContext::new(cli.format, config);

    match cli.command {
        Commands::Segments {
            snapshot,
            window_ms,
            loaded,
            filters,
        } => handlers::segments::handle(&ctx, &snapshot, &filters, window_ms, loaded),

        Commands::Lanes {
            snapshot,
            mode,
            no_compress,
            expand,
            loaded,
            window_ms,
            filters,
        } => handlers::lanes::handle(
            &ctx,
            &snapshot,
            &filters,
            handlers::lanes::LanesOptions {
                mode,
                compress: !no_compress,
                expand: &expand,
                loaded,
                window_ms,
            },
        ),

        Commands::Replay {
            snapshot,
            from,
            loop_start,
            loop_end,
            ticks,
            reverse,
            tick_ms,
            loaded,
            filters,
        } => handlers::replay::handle(
            &ctx,
            &snapshot,
            &filters,
            handlers::replay::ReplayOptions {
                from,
                loop_bounds: loop_start.zip(loop_end),
                ticks,
                direction: if reverse {
                    Direction::Backward
                } else {
                    Direction::Forward
                },
                tick_ms,
                loaded,
            },
        ),

        Commands::Window {
            count,
            item_height,
            container_height,
            scroll_top,
            overscan,
        } => handlers::window::handle(
            &ctx,
            count,
            item_height,
            container_height,
            scroll_top,
            overscan,
        ),
    }
}
