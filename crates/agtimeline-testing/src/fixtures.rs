//! Canned event logs and snapshots.
//!
//! All timestamps are offsets from `BASE_AT` (2025-12-14T00:00:00Z) so that
//! segment windows land on predictable boundaries.

use agtimeline_types::{Entity, RunGraph, Snapshot, SnapshotSource, TimelineEvent};

use crate::builder::EventBuilder;

pub const BASE_AT: i64 = 1_765_670_400_000;

/// Eleven events from three agents (planner > coder > tester) spread over
/// four one-minute windows. `ev-05` arrives after `ev-06`.
pub fn multi_window_log() -> Vec<TimelineEvent> {
    vec![
        EventBuilder::spawn("planner", BASE_AT)
            .id("ev-01")
            .run("r1")
            .text("planner spawned")
            .build(),
        EventBuilder::start("planner", BASE_AT + 5_000)
            .id("ev-02")
            .run("r1")
            .text("planner started")
            .build(),
        EventBuilder::spawn("coder", BASE_AT + 62_000)
            .id("ev-03")
            .run("r2")
            .parent("planner")
            .text("coder spawned")
            .build(),
        EventBuilder::start("coder", BASE_AT + 65_000)
            .id("ev-04")
            .run("r2")
            .parent("planner")
            .text("coder started")
            .build(),
        EventBuilder::spawn("tester", BASE_AT + 125_000)
            .id("ev-06")
            .run("r3")
            .parent("coder")
            .text("tester spawned")
            .build(),
        EventBuilder::error("coder", BASE_AT + 70_000)
            .id("ev-05")
            .run("r2")
            .parent("planner")
            .text("compile failed")
            .build(),
        EventBuilder::start("tester", BASE_AT + 126_000)
            .id("ev-07")
            .run("r3")
            .parent("coder")
            .text("tester started")
            .build(),
        EventBuilder::complete("tester", BASE_AT + 130_000)
            .id("ev-08")
            .run("r3")
            .parent("coder")
            .text("tests passed")
            .build(),
        EventBuilder::complete("coder", BASE_AT + 185_000)
            .id("ev-09")
            .run("r2")
            .parent("planner")
            .text("coder finished")
            .build(),
        EventBuilder::cleanup("coder", BASE_AT + 186_000)
            .id("ev-10")
            .run("r2")
            .parent("planner")
            .text("coder workspace removed")
            .build(),
        EventBuilder::complete("planner", BASE_AT + 190_000)
            .id("ev-11")
            .run("r1")
            .text("planner finished")
            .build(),
    ]
}

/// One agent emitting a five-event run burst followed by a dense cross-run window
pub fn burst_log() -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = (0..5)
        .map(|i| {
            EventBuilder::start("worker", BASE_AT + 600_000 - i * 60_000)
                .id(format!("burst-{}", i))
                .run("r-burst")
                .build()
        })
        .collect();

    events.extend((0..6).map(|i| {
        EventBuilder::start("worker", BASE_AT + 100_000 - i * 2_000)
            .id(format!("dense-{}", i))
            .run(format!("r-dense-{}", i % 3))
            .build()
    }));

    events
}

pub fn entities() -> Vec<Entity> {
    [("planner", "ops"), ("coder", "ops"), ("tester", "lab")]
        .into_iter()
        .map(|(id, room)| Entity {
            id: id.to_string(),
            kind: "agent".to_string(),
            name: None,
            room_id: Some(room.to_string()),
            parent_id: None,
        })
        .collect()
}

pub fn sample_snapshot() -> Snapshot {
    let events = multi_window_log();
    Snapshot {
        generated_at: BASE_AT + 200_000,
        entities: entities(),
        run_graph: RunGraph::from_events(&events),
        events,
        source: SnapshotSource { live: true },
    }
}

pub fn sample_snapshot_json() -> String {
    serde_json::to_string_pretty(&sample_snapshot()).expect("snapshot serializes")
}
