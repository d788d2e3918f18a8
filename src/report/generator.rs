use crate::domain::{parse_timestamp, TaskRecord};
use crate::error::{TaskError, TaskResult};
use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

/// Default trailing window of the weekly summary, in days
pub const DEFAULT_TRAILING_DAYS: i64 = 7;

const NOTE_INDENT: &str = "     ";
const NO_NOTES: &str = "No notes recorded";

/// Build the weekly summary markdown for the records touched in
/// `[now - trailing_days, now]`.
///
/// Output depends only on `records`, `now`, `trailing_days` and `author`.
/// A negative window, or one reaching past the representable dates, is an error.
pub fn generate_markdown(
    records: &[TaskRecord],
    now: NaiveDateTime,
    trailing_days: i64,
    author: &str,
) -> TaskResult<String> {
    let window_start = window_start(now, trailing_days)?;
    let in_window: Vec<&TaskRecord> = records
        .iter()
        .filter(|record| {
            record
                .relevant_time()
                .is_some_and(|ts| ts >= window_start && ts <= now)
        })
        .collect();

    let (pending, completed): (Vec<&TaskRecord>, Vec<&TaskRecord>) =
        in_window.into_iter().partition(|record| record.active);

    let mut lines: Vec<String> = vec![
        "📋 5-15".to_string(),
        String::new(),
        format!(
            "<strong>Name</strong>: {}<br><strong>Week Ending</strong>: {}",
            author,
            now.format("%Y-%m-%d")
        ),
        String::new(),
    ];

    lines.push("### Accomplishments this week".to_string());
    push_groups(&mut lines, &completed, "*No completed tasks this week*");

    lines.push("### Priorities next week".to_string());
    push_groups(&mut lines, &pending, "*No pending tasks for next week*");

    lines.push("### Risks/Challenges".to_string());
    lines.push(String::new());
    lines.push("### Learnings, Opportunities, Feedback, or Observations".to_string());

    let mut report = lines.join("\n");
    report.push('\n');
    Ok(report)
}

fn window_start(now: NaiveDateTime, trailing_days: i64) -> TaskResult<NaiveDateTime> {
    if trailing_days < 0 {
        return Err(TaskError::Report(format!(
            "Report window must not be negative: {} days",
            trailing_days
        )));
    }

    Duration::try_days(trailing_days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            TaskError::Report(format!(
                "Report window of {} days is out of range",
                trailing_days
            ))
        })
}

/// Group by description (ascending) and emit one bullet per note
fn push_groups(lines: &mut Vec<String>, records: &[&TaskRecord], empty_message: &str) {
    if records.is_empty() {
        lines.push(empty_message.to_string());
        lines.push(String::new());
        return;
    }

    let mut groups: BTreeMap<&str, Vec<&TaskRecord>> = BTreeMap::new();
    for record in records.iter().copied() {
        groups.entry(record.description.as_str()).or_default().push(record);
    }

    for (description, mut group) in groups {
        // Unparsable start times go last, like an unsorted tail
        group.sort_by_key(|record| {
            let start = parse_timestamp(&record.start_time).ok();
            (start.is_none(), start)
        });

        lines.push(format!("- {}", description));

        let notes: Vec<&str> = group.iter().flat_map(|record| record.note_entries()).collect();
        if notes.is_empty() {
            lines.push(format!("{}- {}", NOTE_INDENT, NO_NOTES));
        } else {
            for note in notes {
                lines.push(format!("{}- {}", NOTE_INDENT, note));
            }
        }
        lines.push(String::new());
    }
}
