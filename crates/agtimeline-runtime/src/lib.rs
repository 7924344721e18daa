//! Stateful layer over the timeline engine.
//!
//! The engine crate is pure; everything that holds state between calls
//! lives here: configuration, the session with its memoized view, segment
//! loading, the playback timer and snapshot ingestion (stream frames and
//! polling).

pub mod config;
pub mod error;
pub mod loader;
pub mod playback;
pub mod poller;
pub mod session;
pub mod stream;

pub use config::{
    resolve_config_path, CompressionSettings, PollerSettings, ReplaySettings, SegmentSettings,
    TimelineConfig, VirtualizationSettings,
};
pub use error::{Error, Result};
pub use loader::SegmentLoader;
pub use playback::{run_playback, PlaybackTick, PlaybackTimer};
pub use poller::{PollDecision, SnapshotPoller};
pub use session::{ReplayState, TimelineSession, VisibleItems};
pub use stream::{decode_stream_frame, FrameBuffer, StreamFrame, SNAPSHOT_EVENT};
