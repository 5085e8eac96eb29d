//! JSON-lines event export: one serialized `Event` per line.

use std::io::{BufRead, Write};

use contracts::Event;

use crate::PersistenceError;

pub fn write_events_jsonl<W: Write>(
    events: &[Event],
    mut writer: W,
) -> Result<usize, PersistenceError> {
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(events.len())
}

/// Blank lines are skipped.
pub fn read_events_jsonl<R: BufRead>(reader: R) -> Result<Vec<Event>, PersistenceError> {
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str::<Event>(&line)?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AssetId, DetectionOutcome, EventType};

    fn sample_events() -> Vec<Event> {
        vec![
            Event {
                day: 4,
                sequence: 0,
                slot: 0,
                asset_id: AssetId::first(0),
                event_type: EventType::Failure,
                wear_at_event: 2.0,
                cost: 6500.0,
                detection: None,
                measurement: None,
            },
            Event {
                day: 15,
                sequence: 1,
                slot: 2,
                asset_id: AssetId::first(2),
                event_type: EventType::InspectionAlarmRepair,
                wear_at_event: 14.25,
                cost: 450.0,
                detection: Some(DetectionOutcome::TruePositive),
                measurement: Some(14.41),
            },
        ]
    }

    #[test]
    fn writes_one_line_per_event() {
        let mut buffer = Vec::new();
        let written = write_events_jsonl(&sample_events(), &mut buffer).expect("export");
        assert_eq!(written, 2);
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        assert!(text
            .lines()
            .next()
            .is_some_and(|line| line.contains(r#""event_type":"failure""#)));
    }

    #[test]
    fn reads_back_what_was_written() {
        let mut buffer = Vec::new();
        write_events_jsonl(&sample_events(), &mut buffer).expect("export");
        buffer.extend_from_slice(b"\n\n");
        let events = read_events_jsonl(buffer.as_slice()).expect("import");
        assert_eq!(events, sample_events());
    }

    #[test]
    fn malformed_lines_are_errors() {
        let err = read_events_jsonl("{not json}\n".as_bytes()).expect_err("malformed");
        assert!(matches!(err, PersistenceError::Serde(_)));
    }
}
