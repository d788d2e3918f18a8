use super::enums::Completed;
use crate::error::{TaskError, TaskResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Timestamp format used in the table and the event log (minute resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Separator between individual notes in the `Notes` column
pub const NOTE_DELIMITER: &str = " | ";

/// Column names of the task table, in file order
pub const COLUMNS: [&str; 9] = [
    "Task ID",
    "Task Description",
    "Start Time",
    "Stop Time",
    "Duration (min)",
    "Completed",
    "Notes",
    "Active",
    "Updated",
];

/// One row of the task table. Each start of an inactive description creates
/// a new record; records are never merged or deleted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "Task ID", default)]
    pub id: String,
    #[serde(rename = "Task Description", default)]
    pub description: String,
    #[serde(rename = "Start Time", default)]
    pub start_time: String,
    #[serde(rename = "Stop Time", default)]
    pub stop_time: String,
    #[serde(
        rename = "Duration (min)",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub duration_minutes: Option<f64>,
    #[serde(rename = "Completed", default, deserialize_with = "completed_cell")]
    pub completed: Completed,
    #[serde(rename = "Notes", default)]
    pub notes: String,
    #[serde(rename = "Active", default, deserialize_with = "active_flag")]
    pub active: bool,
    #[serde(rename = "Updated", default)]
    pub updated: String,
    /// Cells of columns outside the fixed schema, in the table's extra-column order
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl TaskRecord {
    /// Create a fresh active record started at `now`
    pub fn start(description: &str, note: &str, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            start_time: format_timestamp(now),
            stop_time: String::new(),
            duration_minutes: None,
            completed: Completed::No,
            notes: note.trim().to_string(),
            active: true,
            updated: String::new(),
            extra: Vec::new(),
        }
    }

    /// The fixed cells in `COLUMNS` order, as written to the table
    pub fn cells(&self) -> [String; 9] {
        [
            self.id.clone(),
            self.description.clone(),
            self.start_time.clone(),
            self.stop_time.clone(),
            self.duration_minutes.map(format_duration).unwrap_or_default(),
            self.completed.as_cell().to_string(),
            self.notes.clone(),
            u8::from(self.active).to_string(),
            self.updated.clone(),
        ]
    }

    /// Append a note with the delimiter. Blank notes are ignored.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        if self.notes.trim().is_empty() {
            self.notes = note.to_string();
        } else {
            self.notes = format!("{}{}{}", self.notes, NOTE_DELIMITER, note);
        }
    }

    /// Individual notes in insertion order, whitespace-only fragments dropped
    pub fn note_entries(&self) -> Vec<&str> {
        split_notes(&self.notes)
    }

    /// Stop the record at `now`, returning the computed duration in minutes.
    /// `finished` additionally marks the record completed.
    pub fn close(&mut self, now: NaiveDateTime, finished: bool) -> f64 {
        let duration = duration_minutes(&self.start_time, now);
        let stamp = format_timestamp(now);

        self.stop_time = stamp.clone();
        self.updated = stamp;
        self.duration_minutes = Some(duration);
        self.active = false;
        if finished {
            self.completed = Completed::Yes;
        }
        duration
    }

    /// Later of start and stop time, used to order recent work
    pub fn last_activity(&self) -> Option<NaiveDateTime> {
        latest(&self.start_time, &self.stop_time)
    }

    /// Later of the update and start time, used to scope reports
    pub fn relevant_time(&self) -> Option<NaiveDateTime> {
        latest(&self.updated, &self.start_time)
    }
}

fn latest(a: &str, b: &str) -> Option<NaiveDateTime> {
    let a = parse_timestamp(a).ok();
    let b = parse_timestamp(b).ok();
    a.max(b)
}

/// Split a `Notes` cell into its individual non-blank notes
pub fn split_notes(notes: &str) -> Vec<&str> {
    notes
        .split(NOTE_DELIMITER)
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .collect()
}

pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Seconds are accepted for files written by
/// other tools.
pub fn parse_timestamp(text: &str) -> TaskResult<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| TaskError::ParseFailure(text.to_string()))
}

/// Minutes between `start` and `now`, rounded to two decimals.
/// An unparsable start yields 0 and negative spans are clamped to 0.
pub fn duration_minutes(start: &str, now: NaiveDateTime) -> f64 {
    match parse_timestamp(start) {
        Ok(start) => {
            let minutes = now.signed_duration_since(start).num_seconds() as f64 / 60.0;
            let rounded = (minutes * 100.0).round() / 100.0;
            if rounded <= 0.0 {
                0.0
            } else {
                rounded
            }
        }
        Err(e) => {
            tracing::debug!("{}, duration defaults to 0", e);
            0.0
        }
    }
}

/// Duration cell text; whole minutes keep their decimal ("45.0", "12.5")
pub fn format_duration(minutes: f64) -> String {
    format!("{:?}", minutes)
}

/// Format a duration the way log lines show it ("45.0 min", "12.5 min")
pub fn format_minutes(minutes: f64) -> String {
    format!("{} min", format_duration(minutes))
}

fn active_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let cell = String::deserialize(deserializer)?;
    Ok(matches!(
        cell.trim().to_lowercase().as_str(),
        "1" | "1.0" | "true" | "yes"
    ))
}

fn completed_cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Completed, D::Error> {
    let cell = String::deserialize(deserializer)?;
    Ok(Completed::from_cell(&cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(text: &str) -> NaiveDateTime {
        parse_timestamp(text).unwrap()
    }

    #[test]
    fn test_start_record() {
        let record = TaskRecord::start("Draft proposal", "  outline ", at("2026-10-12 09:00"));
        assert_eq!(record.description, "Draft proposal");
        assert_eq!(record.start_time, "2026-10-12 09:00");
        assert_eq!(record.notes, "outline");
        assert!(record.active);
        assert_eq!(record.completed, Completed::No);
        assert!(record.stop_time.is_empty());
        assert!(record.duration_minutes.is_none());
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_append_note_uses_delimiter() {
        let mut record = TaskRecord::start("X", "", at("2026-10-12 09:00"));
        record.append_note("a");
        record.append_note("   ");
        record.append_note("b");
        assert_eq!(record.notes, "a | b");
        assert_eq!(record.note_entries(), vec!["a", "b"]);
    }

    #[test]
    fn test_split_notes_drops_blank_fragments() {
        assert_eq!(split_notes("one |  | two | "), vec!["one", "two"]);
        assert!(split_notes("").is_empty());
        assert!(split_notes("   ").is_empty());
    }

    #[test]
    fn test_duration_minutes() {
        let now = at("2026-10-12 09:45");
        assert_eq!(duration_minutes("2026-10-12 09:00", now), 45.0);

        let now = at("2026-10-12 09:00") + Duration::seconds(90);
        assert_eq!(duration_minutes("2026-10-12 09:00", now), 1.5);

        let now = at("2026-10-12 09:00") + Duration::seconds(20);
        assert_eq!(duration_minutes("2026-10-12 09:00", now), 0.33);
    }

    #[test]
    fn test_duration_unparsable_start_is_zero() {
        let now = at("2026-10-12 09:45");
        assert_eq!(duration_minutes("", now), 0.0);
        assert_eq!(duration_minutes("yesterday-ish", now), 0.0);
    }

    #[test]
    fn test_duration_negative_is_clamped() {
        let now = at("2026-10-12 08:00");
        assert_eq!(duration_minutes("2026-10-12 09:00", now), 0.0);
    }

    #[test]
    fn test_close_marks_inactive() {
        let mut record = TaskRecord::start("Y", "", at("2026-10-12 09:00"));
        let duration = record.close(at("2026-10-12 10:30"), false);
        assert_eq!(duration, 90.0);
        assert!(!record.active);
        assert_eq!(record.completed, Completed::No);
        assert_eq!(record.stop_time, "2026-10-12 10:30");
        assert_eq!(record.updated, "2026-10-12 10:30");

        let mut record = TaskRecord::start("Y", "", at("2026-10-12 09:00"));
        record.close(at("2026-10-12 09:10"), true);
        assert_eq!(record.completed, Completed::Yes);
        assert_eq!(record.duration_minutes, Some(10.0));
    }

    #[test]
    fn test_parse_timestamp_accepts_seconds() {
        assert_eq!(at("2026-10-12 09:00:30"), at("2026-10-12 09:00") + Duration::seconds(30));
        assert!(matches!(parse_timestamp("nope"), Err(TaskError::ParseFailure(_))));
    }

    #[test]
    fn test_relevant_and_last_activity() {
        let mut record = TaskRecord::start("Z", "", at("2026-10-12 09:00"));
        assert_eq!(record.relevant_time(), Some(at("2026-10-12 09:00")));
        record.updated = "2026-10-14 17:00".to_string();
        assert_eq!(record.relevant_time(), Some(at("2026-10-14 17:00")));

        record.stop_time = "2026-10-13 10:00".to_string();
        assert_eq!(record.last_activity(), Some(at("2026-10-13 10:00")));

        record.start_time = "garbage".to_string();
        record.stop_time = String::new();
        assert_eq!(record.last_activity(), None);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45.0), "45.0 min");
        assert_eq!(format_minutes(12.5), "12.5 min");
        assert_eq!(format_duration(45.0), "45.0");
        assert_eq!(format_duration(0.0), "0.0");
    }
}
