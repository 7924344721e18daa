use agtimeline_types::{EventRef, TimelineFilters};

use crate::index::TimelineIndex;

/// Apply user filters to the index, newest first.
///
/// Pure predicate over `index.descending()`: output order is exactly the
/// index order, so the same filters always yield the same sequence.
pub fn apply_filters(index: &TimelineIndex, filters: &TimelineFilters) -> Vec<EventRef> {
    if filters.is_empty() {
        return index.descending().to_vec();
    }

    index
        .descending()
        .iter()
        .filter(|event| filters.matches(event))
        .cloned()
        .collect()
}
