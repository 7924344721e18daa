pub mod error;
pub mod event;
pub mod filters;
pub mod run_graph;
pub mod snapshot;

pub use error::SnapshotError;
pub use event::*;
pub use filters::*;
pub use run_graph::*;
pub use snapshot::*;
