use super::files::{append_to_file, atomic_write, read_file};
use crate::domain::{format_minutes, format_timestamp, parse_timestamp, LogEvent, TaskRecord};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};

/// Append-only text mirror of lifecycle transitions.
///
/// Each line reads `<emoji> <timestamp> - <status> - <description>`.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one entry. The file is opened, written, synced and closed per call.
    pub fn append(&self, event: LogEvent, timestamp: NaiveDateTime, description: &str) -> Result<()> {
        append_to_file(&self.path, &format_line(event, timestamp, description))
    }

    pub fn read(&self) -> Result<String> {
        read_file(&self.path)
    }

    /// Create the log from the table when it does not exist yet.
    /// Returns `false` when a log was already present.
    pub fn seed_from_table(&self, records: &[TaskRecord], now: NaiveDateTime) -> Result<bool> {
        if self.path.exists() {
            tracing::debug!("Event log already exists at {}", self.path.display());
            return Ok(false);
        }

        let mut content = format!(
            "# Task Logger History - Created on {}\n\n",
            now.format("%Y-%m-%d %H:%M:%S")
        );
        for (timestamp, event, description) in synthesize_events(records) {
            content.push_str(&format_line(event, timestamp, &description));
        }

        atomic_write(&self.path, &content)?;
        tracing::info!(
            "Seeded event log {} from {} task records",
            self.path.display(),
            records.len()
        );
        Ok(true)
    }
}

pub fn format_line(event: LogEvent, timestamp: NaiveDateTime, description: &str) -> String {
    format!(
        "{} {} - {} - {}\n",
        event.emoji(),
        format_timestamp(timestamp),
        event.status(),
        description
    )
}

/// Description part of stop/finish lines, carrying the duration
pub fn with_duration(description: &str, minutes: f64) -> String {
    format!("{} ({})", description, format_minutes(minutes))
}

/// Derive the events a table implies, newest first. Records with an
/// unparsable timestamp contribute no event for that timestamp.
pub fn synthesize_events(records: &[TaskRecord]) -> Vec<(NaiveDateTime, LogEvent, String)> {
    let mut events = Vec::new();

    for record in records {
        if let Ok(start) = parse_timestamp(&record.start_time) {
            events.push((start, LogEvent::Started, record.description.clone()));
        }

        let stop = parse_timestamp(&record.stop_time).ok();
        if !record.active {
            if let Some(stop) = stop {
                let event = if record.completed.is_yes() {
                    LogEvent::Finished
                } else {
                    LogEvent::Stopped
                };
                let minutes = record.duration_minutes.unwrap_or(0.0);
                events.push((stop, event, with_duration(&record.description, minutes)));
            }
        }

        if let Ok(updated) = parse_timestamp(&record.updated) {
            if Some(updated) != stop {
                events.push((updated, LogEvent::NoteAdded, record.description.clone()));
            }
        }
    }

    events.sort_by_key(|(timestamp, _, _)| Reverse(*timestamp));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Completed;
    use std::fs;

    fn at(text: &str) -> NaiveDateTime {
        parse_timestamp(text).unwrap()
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(LogEvent::Started, at("2026-10-12 09:00"), "Draft proposal"),
            "▶️ 2026-10-12 09:00 - In Progress - Draft proposal\n"
        );
        assert_eq!(
            format_line(
                LogEvent::Stopped,
                at("2026-10-12 09:45"),
                &with_duration("Draft proposal", 45.0)
            ),
            "⏹️ 2026-10-12 09:45 - Stopped - Draft proposal (45.0 min)\n"
        );
    }

    #[test]
    fn test_append_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(temp_dir.path().join("exports").join("task_history.log"));

        log.append(LogEvent::Started, at("2026-10-12 09:00"), "A").unwrap();
        log.append(LogEvent::NoteAdded, at("2026-10-12 09:05"), "A").unwrap();

        let content = log.read().unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with("ℹ️ 2026-10-12 09:05 - Notes Added - A\n"));
    }

    #[test]
    fn test_synthesize_events() {
        let mut finished = TaskRecord::start("Done", "", at("2026-10-12 09:00"));
        finished.close(at("2026-10-12 10:00"), true);

        let mut noted = TaskRecord::start("Noted", "", at("2026-10-12 11:00"));
        noted.updated = "2026-10-12 11:30".to_string();

        let mut broken = TaskRecord::start("Broken", "", at("2026-10-12 08:00"));
        broken.start_time = "not a time".to_string();

        let events = synthesize_events(&[finished, noted, broken]);
        let summary: Vec<(String, LogEvent, &str)> = events
            .iter()
            .map(|(ts, event, desc)| (format_timestamp(*ts), *event, desc.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("2026-10-12 11:30".to_string(), LogEvent::NoteAdded, "Noted"),
                ("2026-10-12 11:00".to_string(), LogEvent::Started, "Noted"),
                ("2026-10-12 10:00".to_string(), LogEvent::Finished, "Done (60.0 min)"),
                ("2026-10-12 09:00".to_string(), LogEvent::Started, "Done"),
            ]
        );
    }

    #[test]
    fn test_stopped_record_without_completion() {
        let mut stopped = TaskRecord::start("Paused work", "", at("2026-10-12 09:00"));
        stopped.close(at("2026-10-12 09:30"), false);
        assert_eq!(stopped.completed, Completed::No);

        let events = synthesize_events(&[stopped]);
        assert_eq!(events[0].1, LogEvent::Stopped);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_seed_only_when_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("task_history.log");
        let log = EventLog::new(&path);
        let records = vec![TaskRecord::start("A", "", at("2026-10-12 09:00"))];

        assert!(log.seed_from_table(&records, at("2026-10-18 08:00")).unwrap());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Task Logger History - Created on 2026-10-18 08:00:00\n\n"));
        assert!(content.contains("▶️ 2026-10-12 09:00 - In Progress - A\n"));

        assert!(!log.seed_from_table(&records, at("2026-10-18 09:00")).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }
}
