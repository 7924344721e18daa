use agtimeline_types::Snapshot;

use crate::Result;

/// Event name carrying a full dashboard snapshot
pub const SNAPSHOT_EVENT: &str = "snapshot";

/// One decoded server-push frame
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    Snapshot(Snapshot),
    /// Any other event name, including comment-only keep-alives
    Ignored { event: String },
}

/// Decode one frame of `field: value` lines.
///
/// `event:` names the frame (default `message`), `data:` lines are joined
/// with newlines, lines starting with `:` are comments. Only `snapshot`
/// frames are parsed; their payload must be a valid snapshot.
pub fn decode_stream_frame(frame: &str) -> Result<StreamFrame> {
    let mut event = String::from("message");
    let mut data: Vec<&str> = Vec::new();

    for line in frame.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = value.to_string(),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event != SNAPSHOT_EVENT {
        return Ok(StreamFrame::Ignored { event });
    }

    let snapshot = Snapshot::from_json_str(&data.join("\n"))?;
    Ok(StreamFrame::Snapshot(snapshot))
}

/// Splits a chunked byte stream into complete frames separated by blank lines
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: String,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        if self.pending.contains('\r') {
            self.pending = self.pending.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(end) = self.pending.find("\n\n") {
            let frame: String = self.pending.drain(..end + 2).collect();
            let frame = frame.trim_end_matches('\n');
            if !frame.is_empty() {
                frames.push(frame.to_string());
            }
        }
        frames
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use agtimeline_testing::fixtures;
    use agtimeline_types::SnapshotError;

    fn snapshot_frame() -> String {
        let json = serde_json::to_string(&fixtures::sample_snapshot()).unwrap();
        format!("event: snapshot\ndata: {}\n", json)
    }

    #[test]
    fn test_snapshot_frame_is_decoded() {
        let frame = decode_stream_frame(&snapshot_frame()).unwrap();
        let StreamFrame::Snapshot(snapshot) = frame else {
            panic!("expected snapshot frame");
        };
        assert_eq!(snapshot.events.len(), 11);
        assert!(snapshot.source.live);
    }

    #[test]
    fn test_other_events_are_ignored() {
        let frame = decode_stream_frame("event: heartbeat\ndata: {}\n").unwrap();
        assert_eq!(
            frame,
            StreamFrame::Ignored {
                event: "heartbeat".to_string()
            }
        );

        let comment = decode_stream_frame(": keep-alive").unwrap();
        assert_eq!(
            comment,
            StreamFrame::Ignored {
                event: "message".to_string()
            }
        );
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let frame = "event: snapshot\ndata: {\"events\":\ndata: []}\n";
        let StreamFrame::Snapshot(snapshot) = decode_stream_frame(frame).unwrap() else {
            panic!("expected snapshot frame");
        };
        assert!(snapshot.events.is_empty());
    }

    #[test]
    fn test_invalid_snapshot_payload_is_rejected() {
        let err = decode_stream_frame("event: snapshot\ndata: [1, 2]\n").unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::NotAnObject(_))));

        let err = decode_stream_frame("event: snapshot\ndata: {not json\n").unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::InvalidJson(_))));
    }

    #[test]
    fn test_frame_buffer_splits_across_chunks() {
        let mut buffer = FrameBuffer::new();
        let text = format!("{}\nevent: ping\r\ndata: x\r\n\r\n", snapshot_frame());
        let (head, tail) = text.split_at(40);

        assert!(buffer.push(head).is_empty());
        let frames = buffer.push(tail);

        assert_eq!(frames.len(), 2);
        assert!(frames[0].starts_with("event: snapshot"));
        assert_eq!(frames[1], "event: ping\ndata: x");
        assert!(buffer.pending().is_empty());
    }
}
