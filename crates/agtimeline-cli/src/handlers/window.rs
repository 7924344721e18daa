use agtimeline_engine::compute_virtual_window;
use anyhow::{bail, Result};

use super::HandlerContext;
use crate::presentation::WindowViewModel;

pub fn handle(
    ctx: &HandlerContext,
    count: usize,
    item_height: Option<f64>,
    container_height: f64,
    scroll_top: f64,
    overscan: Option<usize>,
) -> Result<()> {
    if !container_height.is_finite() || !scroll_top.is_finite() {
        bail!("container height and scroll offset must be finite numbers");
    }

    let settings = &ctx.config.virtualization;
    let window = compute_virtual_window(
        count,
        item_height.unwrap_or(settings.item_height),
        container_height,
        scroll_top,
        overscan.unwrap_or(settings.overscan),
    );

    ctx.render(WindowViewModel {
        item_count: count,
        virtualized: count > settings.threshold,
        window,
    })
}
