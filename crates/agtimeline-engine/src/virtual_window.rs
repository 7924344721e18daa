use serde::Serialize;

pub const DEFAULT_OVERSCAN: usize = 3;

/// Lanes at or below this many items render fully without virtualization
pub const VIRTUALIZATION_THRESHOLD: usize = 100;

/// Visible slice of a fixed-height list; `end_index` is exclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub total_height: f64,
    pub offset_y: f64,
}

impl VirtualWindow {
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_index..self.end_index.max(self.start_index)
    }
}

pub fn should_virtualize(item_count: usize) -> bool {
    item_count > VIRTUALIZATION_THRESHOLD
}

/// Compute the rendered slice for the current scroll position.
///
/// Non-positive item heights render every item; negative scroll offsets are
/// treated as zero.
pub fn compute_virtual_window(
    item_count: usize,
    item_height: f64,
    container_height: f64,
    scroll_top: f64,
    overscan: usize,
) -> VirtualWindow {
    if item_height.is_nan() || item_height <= 0.0 {
        return VirtualWindow {
            start_index: 0,
            end_index: item_count,
            total_height: 0.0,
            offset_y: 0.0,
        };
    }

    let first_visible = (scroll_top.max(0.0) / item_height).floor() as usize;
    let visible_count = (container_height.max(0.0) / item_height).ceil() as usize;

    let start_index = first_visible.saturating_sub(overscan).min(item_count);
    let end_index = first_visible
        .saturating_add(visible_count)
        .saturating_add(overscan)
        .min(item_count);

    VirtualWindow {
        start_index,
        end_index,
        total_height: item_count as f64 * item_height,
        offset_y: start_index as f64 * item_height,
    }
}
