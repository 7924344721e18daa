use agtimeline_types::EventRef;
use serde::{Deserialize, Serialize};

/// Step direction for manual stepping and playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn delta(&self) -> isize {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }

    /// Negative values step backward, anything else forward
    pub fn from_sign(sign: i64) -> Self {
        if sign < 0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

/// Inclusive loop bounds over playback indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRange {
    pub start: usize,
    pub end: usize,
}

impl LoopRange {
    /// Build a range from two bookmarks in either order
    pub fn normalized(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Loaded events in ascending time order, for replay navigation only.
///
/// Expects the newest-first loaded sequence; the stable sort keeps arrival
/// order among equal timestamps.
pub fn playback_sequence(loaded: &[EventRef]) -> Vec<EventRef> {
    let mut sequence = loaded.to_vec();
    sequence.sort_by_key(|e| e.at);
    sequence
}

/// Id of the neighbour of `current_id`, or None when it is missing or the move leaves the sequence.
/// Never wraps.
pub fn next_adjacent_id(
    sequence: &[EventRef],
    current_id: &str,
    direction: Direction,
) -> Option<String> {
    let position = sequence.iter().position(|e| e.id == current_id)?;
    let next = position.checked_add_signed(direction.delta())?;
    sequence.get(next).map(|e| e.id.clone())
}

/// Next playback index for one timer tick.
///
/// `current` is None when nothing is selected, which behaves like "one before
/// the start". Without a loop the index advances and falls off either end as
/// None (the caller stops playback). With a loop, moving past `end` wraps to
/// `start` and moving before `start` wraps to `end`; loop bounds beyond the
/// sequence are clamped to its last index.
pub fn next_replay_index(
    current: Option<usize>,
    total: usize,
    direction: Direction,
    loop_range: Option<LoopRange>,
) -> Option<usize> {
    if total == 0 {
        return None;
    }

    let Some(range) = loop_range else {
        return match current {
            None => match direction {
                Direction::Forward => Some(0),
                Direction::Backward => None,
            },
            Some(index) => index
                .checked_add_signed(direction.delta())
                .filter(|next| *next < total),
        };
    };

    let last = total - 1;
    let start = range.start.min(last);
    let end = range.end.min(last);
    if start > end {
        return None;
    }

    let Some(index) = current else {
        return Some(match direction {
            Direction::Forward => start,
            Direction::Backward => end,
        });
    };

    match direction {
        Direction::Forward if index >= end || index < start => Some(start),
        Direction::Backward if index <= start || index > end => Some(end),
        Direction::Forward => Some(index + 1),
        Direction::Backward => Some(index - 1),
    }
}
