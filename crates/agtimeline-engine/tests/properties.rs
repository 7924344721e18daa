use agtimeline_engine::*;
use agtimeline_types::{EventRef, EventType, RunGraph, TimelineEvent, TimelineFilters};
use proptest::prelude::*;
use std::collections::HashSet;

fn arb_event() -> impl Strategy<Value = TimelineEvent> {
    (
        0u8..40,
        prop::sample::select(EventType::ALL.to_vec()),
        prop::sample::select(vec!["lead", "coder", "tester", "reviewer"]),
        prop::option::of(prop::sample::select(vec!["r1", "r2", "r3"])),
        prop::option::of(prop::sample::select(vec!["lead", "coder"])),
        0i64..600_000,
    )
        .prop_map(|(id, event_type, agent, run, parent, at)| TimelineEvent {
            id: format!("e{}", id),
            event_type,
            agent_id: agent.to_string(),
            parent_agent_id: parent.map(str::to_string),
            run_id: run.map(str::to_string),
            at,
            text: String::new(),
        })
}

fn arb_log() -> impl Strategy<Value = Vec<TimelineEvent>> {
    prop::collection::vec(arb_event(), 0..120)
}

fn ids(events: &[EventRef]) -> Vec<String> {
    events.iter().map(|e| e.id.clone()).collect()
}

proptest! {
    #[test]
    fn index_is_complete(log in arb_log()) {
        let unique: HashSet<&str> = log.iter().map(|e| e.id.as_str()).collect();
        let expected_unique = unique.len();
        let total = log.len();

        let index = TimelineIndex::from_events(log, RunGraph::default());

        prop_assert_eq!(index.unique_len(), expected_unique);
        prop_assert_eq!(index.descending().len(), total);
        prop_assert!(index.descending().windows(2).all(|w| w[0].at >= w[1].at));
    }

    #[test]
    fn filtering_is_deterministic(log in arb_log(), agent in "[a-z]{0,3}") {
        let index = TimelineIndex::from_events(log, RunGraph::default());
        let filters = TimelineFilters { agent_id: agent, ..Default::default() };

        prop_assert_eq!(
            ids(&apply_filters(&index, &filters)),
            ids(&apply_filters(&index, &filters))
        );
    }

    #[test]
    fn segments_partition_the_sequence(log in arb_log(), window_ms in 1i64..200_000) {
        let index = TimelineIndex::from_events(log, RunGraph::default());
        let filtered = apply_filters(&index, &TimelineFilters::default());

        let segments = segment_events(&filtered, window_ms);

        let concatenated: Vec<EventRef> = segments.iter().flat_map(|s| s.events.clone()).collect();
        prop_assert_eq!(ids(&concatenated), ids(&filtered));
        prop_assert!(segments.iter().all(|s| s.event_count == s.events.len() && s.event_count > 0));
        prop_assert!(segments.windows(2).all(|w| w[0].window_start > w[1].window_start));
        prop_assert!(segments.iter().all(|s| s
            .events
            .iter()
            .all(|e| e.at >= s.window_start && e.at < s.window_end)));
    }

    #[test]
    fn compression_conserves_events(
        log in arb_log(),
        enabled in any::<bool>(),
        run_burst_threshold in 0usize..8,
        dense_threshold in 0usize..10,
        dense_window_ms in 0i64..120_000,
    ) {
        let index = TimelineIndex::from_events(log, RunGraph::default());
        let config = CompressionConfig { run_burst_threshold, dense_threshold, dense_window_ms };

        for lane in partition_lanes(index.descending(), LaneMode::Agent, &NoRooms) {
            let items = compress_lane(&lane, enabled, &config, &RunGraph::default());
            let total: usize = items.iter().map(lane_item_event_count).sum();
            prop_assert_eq!(total, lane.event_count);

            let flattened: Vec<EventRef> = items.iter().flat_map(|i| i.events().to_vec()).collect();
            prop_assert_eq!(ids(&flattened), ids(&lane.events));
        }
    }

    #[test]
    fn compression_keys_are_stable(log in arb_log()) {
        let index = TimelineIndex::from_events(log, RunGraph::default());
        let config = CompressionConfig::default();

        for lane in partition_lanes(index.descending(), LaneMode::Subagent, &NoRooms) {
            let first: Vec<String> = compress_lane(&lane, true, &config, &RunGraph::default()).iter().map(|i| i.key().to_string()).collect();
            let second: Vec<String> = compress_lane(&lane, true, &config, &RunGraph::default()).iter().map(|i| i.key().to_string()).collect();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn lanes_partition_loaded_events(log in arb_log()) {
        let index = TimelineIndex::from_events(log, RunGraph::default());
        let rooms = |agent: &str| (agent.len() % 2 == 0).then(|| format!("room-{}", agent.len()));

        for mode in [LaneMode::Room, LaneMode::Agent, LaneMode::Subagent] {
            let lanes = partition_lanes(index.descending(), mode, &rooms);
            let total: usize = lanes.iter().map(|l| l.event_count).sum();
            prop_assert_eq!(total, index.len());
            prop_assert!(lanes.windows(2).all(|w| w[0].event_count >= w[1].event_count));
        }
    }

    #[test]
    fn replay_index_stays_in_bounds(
        current in prop::option::of(0usize..50),
        total in 0usize..50,
        forward in any::<bool>(),
        bounds in prop::option::of((0usize..50, 0usize..50)),
    ) {
        let direction = if forward { Direction::Forward } else { Direction::Backward };
        let loop_range = bounds.map(|(a, b)| LoopRange::normalized(a, b));

        if let Some(next) = next_replay_index(current, total, direction, loop_range) {
            prop_assert!(next < total);
            if let Some(range) = loop_range {
                prop_assert!(next >= range.start.min(total - 1) && next <= range.end.min(total - 1));
            }
        }
    }
}
