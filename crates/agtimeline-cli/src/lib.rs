// NOTE: agtimeline Architecture Rationale
//
// Why snapshots as the only input (not incremental event feeds)?
// - Dashboards deliver full state on every poll or stream frame
// - Replacing the whole snapshot keeps the pipeline a pure function of its input
// - Trade-off: every update re-indexes, which is cheap at dashboard scale
//
// Why keep the CLI thin?
// - All derived state (segments, lanes, summaries, replay cursor) lives in the runtime session
// - Handlers only translate flags into session inputs and session output into view models

mod args;
mod commands;
mod handlers;
pub mod logging;
pub mod presentation;
pub mod types;

pub use args::{Cli, Commands, FilterArgs};
pub use commands::run;
pub use types::{LogLevel, OutputFormat};
