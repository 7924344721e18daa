use agtimeline_engine::{Direction, LaneItem, LaneMode, LoopRange, TimelineView, VirtualWindow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::renderer::TitledView;

fn format_clock(at: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(at)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| at.to_string())
}

// --------------------------------------------------------
// Segments
// --------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRow {
    pub id: String,
    pub label: String,
    pub event_count: usize,
    pub run_count: usize,
    pub loaded: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentsViewModel {
    pub window_ms: i64,
    pub total_events: usize,
    pub filtered_count: usize,
    pub loaded_segment_count: usize,
    pub has_more_segments: bool,
    pub segments: Vec<SegmentRow>,
}

impl SegmentsViewModel {
    pub fn from_view(view: &TimelineView, window_ms: i64) -> Self {
        Self {
            window_ms,
            total_events: view.total_events,
            filtered_count: view.filtered_count,
            loaded_segment_count: view.loaded_segment_count,
            has_more_segments: view.has_more_segments,
            segments: view
                .segments
                .iter()
                .enumerate()
                .map(|(i, s)| SegmentRow {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    event_count: s.event_count,
                    run_count: s.run_count,
                    loaded: i < view.loaded_segment_count,
                })
                .collect(),
        }
    }
}

impl TitledView for SegmentsViewModel {
    fn title(&self) -> String {
        format!(
            "Segments: {} ({} of {} events, {} ms windows)",
            self.segments.len(),
            self.filtered_count,
            self.total_events,
            self.window_ms
        )
    }
}

impl fmt::Display for SegmentsViewModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.segments.is_empty() {
            writeln!(f, "No events match the current filters.")?;
            return Ok(());
        }

        writeln!(
            f,
            "{:<16} {:<32} {:>6} {:>5}  LOADED",
            "ID", "WINDOW", "EVENTS", "RUNS"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;
        for segment in &self.segments {
            writeln!(
                f,
                "{:<16} {:<32} {:>6} {:>5}  {}",
                segment.id,
                segment.label,
                segment.event_count,
                segment.run_count,
                if segment.loaded { "yes" } else { "no" }
            )?;
        }

        if self.has_more_segments {
            writeln!(
                f,
                "\n{} older segment(s) not loaded; pass --loaded to load more",
                self.segments.len() - self.loaded_segment_count
            )?;
        }
        Ok(())
    }
}

// --------------------------------------------------------
// Lanes
// --------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    pub kind: &'static str,
    pub key: String,
    pub label: String,
    pub event_count: usize,
    pub latest_at: i64,
}

impl From<&LaneItem> for ItemRow {
    fn from(item: &LaneItem) -> Self {
        match item {
            LaneItem::Event { key, event } => {
                let mut label = format!("{} {}", event.event_type, event.agent_id);
                if !event.text.is_empty() {
                    label.push_str("  ");
                    label.push_str(&event.text);
                }
                Self {
                    kind: "event",
                    key: key.clone(),
                    label,
                    event_count: 1,
                    latest_at: event.at,
                }
            }
            LaneItem::Summary(summary) => Self {
                kind: "summary",
                key: summary.key.clone(),
                label: summary.label.clone(),
                event_count: summary.event_count,
                latest_at: summary.latest_at,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneRow {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub event_count: usize,
    pub run_count: usize,
    pub density_per_minute: u64,
    pub virtualized: bool,
    pub items: Vec<ItemRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanesViewModel {
    pub mode: LaneMode,
    pub loaded_events: usize,
    pub lanes: Vec<LaneRow>,
}

impl TitledView for LanesViewModel {
    fn title(&self) -> String {
        format!(
            "Lanes by {}: {} ({} loaded events)",
            self.mode,
            self.lanes.len(),
            self.loaded_events
        )
    }
}

impl fmt::Display for LanesViewModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.lanes.is_empty() {
            writeln!(f, "No events loaded.")?;
            return Ok(());
        }

        for lane in &self.lanes {
            writeln!(
                f,
                "\n{}  {}  ({} events, {} runs, {}/min)",
                lane.key, lane.label, lane.event_count, lane.run_count, lane.density_per_minute
            )?;
            for item in &lane.items {
                let marker = if item.kind == "summary" { "+" } else { "-" };
                write!(f, "  {} {}  {}", marker, format_clock(item.latest_at), item.label)?;
                if item.kind == "summary" {
                    write!(f, "  [{}]", item.key)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// --------------------------------------------------------
// Replay
// --------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayViewModel {
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_range: Option<LoopRange>,
    pub playback_len: usize,
    pub visited: Vec<String>,
    /// Playback reached the end of the sequence on its own
    pub stopped: bool,
}

impl TitledView for ReplayViewModel {
    fn title(&self) -> String {
        format!(
            "Replay: {} step(s) over {} loaded events",
            self.visited.len(),
            self.playback_len
        )
    }
}

impl fmt::Display for ReplayViewModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(range) = &self.loop_range {
            writeln!(f, "loop: {}..={}", range.start, range.end)?;
        }
        for id in &self.visited {
            writeln!(f, "{}", id)?;
        }
        if self.stopped {
            writeln!(f, "(end of sequence)")?;
        }
        Ok(())
    }
}

// --------------------------------------------------------
// Virtual window
// --------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowViewModel {
    pub item_count: usize,
    pub virtualized: bool,
    #[serde(flatten)]
    pub window: VirtualWindow,
}

impl TitledView for WindowViewModel {
    fn title(&self) -> String {
        format!(
            "Window: items {}..{} of {}",
            self.window.start_index, self.window.end_index, self.item_count
        )
    }
}

impl fmt::Display for WindowViewModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "startIndex: {}", self.window.start_index)?;
        writeln!(f, "endIndex: {}", self.window.end_index)?;
        writeln!(f, "totalHeight: {}", self.window.total_height)?;
        writeln!(f, "offsetY: {}", self.window.offset_y)?;
        writeln!(f, "virtualized: {}", self.virtualized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_is_utc() {
        assert_eq!(format_clock(1_765_670_465_000), "00:01:05");
    }

    #[test]
    fn test_window_plain_output() {
        let view = WindowViewModel {
            item_count: 1000,
            virtualized: true,
            window: VirtualWindow {
                start_index: 7,
                end_index: 19,
                total_height: 72000.0,
                offset_y: 504.0,
            },
        };
        assert_eq!(
            view.to_string(),
            "startIndex: 7\nendIndex: 19\ntotalHeight: 72000\noffsetY: 504\nvirtualized: true\n"
        );
        assert_eq!(view.title(), "Window: items 7..19 of 1000");
    }
}
