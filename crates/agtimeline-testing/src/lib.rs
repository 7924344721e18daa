//! Testing infrastructure for agtimeline tests.
//!
//! - `EventBuilder`: fluent construction of timeline events
//! - `fixtures`: canned event logs and snapshots
//! - `world`: temporary snapshot files for CLI integration tests

pub mod builder;
pub mod fixtures;
pub mod world;

pub use builder::EventBuilder;
pub use world::TestWorld;
