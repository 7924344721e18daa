use agtimeline_types::EventRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Default segment width: five minutes
pub const DEFAULT_SEGMENT_WINDOW_MS: i64 = 5 * 60 * 1000;

/// A contiguous epoch-anchored time window over the filtered sequence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Stable across builds for the same wall-clock window
    pub id: String,
    pub label: String,
    pub window_start: i64,
    /// Exclusive
    pub window_end: i64,
    pub events: Vec<EventRef>,
    pub event_count: usize,
    pub run_count: usize,
}

/// Partition a newest-first sequence into fixed-width windows, newest first.
///
/// Windows are `floor(at / window_ms)` so ids depend only on wall-clock time,
/// not on the first event seen. Consecutive events sharing a window form one
/// segment; concatenating the segments reproduces the input exactly. Empty
/// windows are never emitted.
pub fn segment_events(events: &[EventRef], window_ms: i64) -> Vec<Segment> {
    let window_ms = window_ms.max(1);
    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Option<(i64, Vec<EventRef>)> = None;
    let mut seen_windows: HashMap<i64, usize> = HashMap::new();

    for event in events {
        let window = event.at.div_euclid(window_ms);
        if let Some((w, group)) = current.as_mut()
            && *w == window
        {
            group.push(event.clone());
            continue;
        }
        if let Some((w, group)) = current.replace((window, vec![event.clone()])) {
            segments.push(make_segment(w, window_ms, group, &mut seen_windows));
        }
    }

    if let Some((w, group)) = current {
        segments.push(make_segment(w, window_ms, group, &mut seen_windows));
    }

    segments
}

/// Flatten the first `loaded` segments back into one newest-first sequence
pub fn loaded_events(segments: &[Segment], loaded: usize) -> Vec<EventRef> {
    segments
        .iter()
        .take(loaded)
        .flat_map(|s| s.events.iter().cloned())
        .collect()
}

fn make_segment(
    window: i64,
    window_ms: i64,
    events: Vec<EventRef>,
    seen_windows: &mut HashMap<i64, usize>,
) -> Segment {
    let window_start = window.saturating_mul(window_ms);
    let window_end = window_start.saturating_add(window_ms);

    // Out-of-order input can revisit a window; keep ids unique within one build
    let occurrence = seen_windows.entry(window).or_insert(0);
    let id = if *occurrence == 0 {
        format!("seg-{}", window)
    } else {
        format!("seg-{}-{}", window, occurrence)
    };
    *occurrence += 1;

    let run_count = events
        .iter()
        .filter_map(|e| e.run_id())
        .collect::<HashSet<_>>()
        .len();

    Segment {
        id,
        label: window_label(window_start, window_end),
        window_start,
        window_end,
        event_count: events.len(),
        run_count,
        events,
    }
}

fn window_label(start_ms: i64, end_ms: i64) -> String {
    match (
        DateTime::<Utc>::from_timestamp_millis(start_ms),
        DateTime::<Utc>::from_timestamp_millis(end_ms),
    ) {
        (Some(start), Some(end)) if start.date_naive() == end.date_naive() => format!(
            "{} - {}",
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%H:%M:%S")
        ),
        (Some(start), Some(end)) => format!(
            "{} - {}",
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%Y-%m-%d %H:%M:%S")
        ),
        _ => format!("{} - {}", start_ms, end_ms),
    }
}
