pub mod renderer;
pub mod view_models;

pub use renderer::{CommandResult, ConsoleRenderer, TitledView};
pub use view_models::{
    ItemRow, LaneRow, LanesViewModel, ReplayViewModel, SegmentRow, SegmentsViewModel,
    WindowViewModel,
};
