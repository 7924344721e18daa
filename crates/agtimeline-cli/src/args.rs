// NOTE: Command Organization Rationale
//
// Why one subcommand per engine stage (not a single "show")?
// - Each stage has its own knobs (window size, lane mode, loop bounds, geometry)
// - Output of every command is the stage's own view model, so JSON stays small and stable
// - `window` needs no snapshot at all; it exercises the geometry math alone

use agtimeline_engine::LaneMode;
use agtimeline_types::{StatusFilter, TimelineFilters};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::types::{LogLevel, OutputFormat};

#[derive(Parser)]
#[command(name = "agtimeline")]
#[command(about = "Inspect agent-run timelines from dashboard snapshots", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Config file (default: $AGTIMELINE_PATH/config.toml or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long, help = "Keep events whose run id contains this text")]
    pub run: Option<String>,

    #[arg(long, help = "Keep events whose agent id contains this text")]
    pub agent: Option<String>,

    #[arg(long, help = "all, spawn, start, end, error or cleanup")]
    pub status: Option<StatusFilter>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> TimelineFilters {
        TimelineFilters {
            run_id: self.run.clone().unwrap_or_default(),
            agent_id: self.agent.clone().unwrap_or_default(),
            status: self.status.unwrap_or_default(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Split a snapshot into time-window segments")]
    Segments {
        snapshot: PathBuf,

        #[arg(long, help = "Segment window in milliseconds")]
        window_ms: Option<i64>,

        #[arg(long, help = "Number of newest segments to load")]
        loaded: Option<usize>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    #[command(about = "Partition loaded events into lanes and compress bursts")]
    Lanes {
        snapshot: PathBuf,

        #[arg(long, default_value = "agent", help = "room, agent or subagent")]
        mode: LaneMode,

        #[arg(long, help = "Show every event instead of burst summaries")]
        no_compress: bool,

        #[arg(long = "expand", value_name = "KEY", help = "Expand a summary by key (repeatable)")]
        expand: Vec<String>,

        #[arg(long, help = "Number of newest segments to load")]
        loaded: Option<usize>,

        #[arg(long, help = "Segment window in milliseconds")]
        window_ms: Option<i64>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    #[command(about = "Replay loaded events in time order")]
    Replay {
        snapshot: PathBuf,

        #[arg(long, value_name = "ID", help = "Start after this event")]
        from: Option<String>,

        #[arg(long, requires = "loop_end", help = "First playback index of the loop")]
        loop_start: Option<usize>,

        #[arg(long, requires = "loop_start", help = "Last playback index of the loop")]
        loop_end: Option<usize>,

        #[arg(long, help = "Stop after this many steps")]
        ticks: Option<usize>,

        #[arg(long, help = "Play newest to oldest")]
        reverse: bool,

        #[arg(long, help = "Milliseconds between steps; 0 steps without waiting")]
        tick_ms: Option<u64>,

        #[arg(long, help = "Number of newest segments to load")]
        loaded: Option<usize>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    #[command(about = "Compute the rendered slice of a virtualized list")]
    Window {
        #[arg(long)]
        count: usize,

        #[arg(long, help = "Row height in pixels (default from config)")]
        item_height: Option<f64>,

        #[arg(long)]
        container_height: f64,

        #[arg(long, allow_negative_numbers = true)]
        scroll_top: f64,

        #[arg(long, help = "Rows rendered beyond each edge (default from config)")]
        overscan: Option<usize>,
    },
}
