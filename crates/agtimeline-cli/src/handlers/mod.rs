mod context;

pub mod lanes;
pub mod replay;
pub mod segments;
pub mod window;

pub use context::HandlerContext;
