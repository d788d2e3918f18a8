use crate::domain::{parse_timestamp, EntryCategory, HistoryFilter};
use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::fmt;

/// One parsed line of the event log
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub emoji: String,
    /// `None` when the timestamp text does not parse; such entries sort last
    pub timestamp: Option<NaiveDateTime>,
    pub timestamp_text: String,
    pub status: String,
    pub description: String,
    pub category: EntryCategory,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {} - {}",
            self.emoji, self.timestamp_text, self.status, self.description
        )
    }
}

/// Parse `<emoji> <timestamp> - <status> - <description>`.
/// A trailing `:` after the timestamp is tolerated.
pub fn parse_line(line: &str) -> Option<HistoryEntry> {
    let mut parts = line.trim().splitn(3, " - ");
    let head = parts.next()?;
    let status = parts.next()?.trim();
    let description = parts.next()?.trim();

    let (emoji, timestamp_text) = head.split_once(' ')?;
    let timestamp_text = timestamp_text.trim().trim_end_matches(':').trim();
    if emoji.is_empty() || timestamp_text.is_empty() || status.is_empty() {
        return None;
    }

    Some(HistoryEntry {
        emoji: emoji.to_string(),
        timestamp: parse_timestamp(timestamp_text).ok(),
        timestamp_text: timestamp_text.to_string(),
        status: status.to_string(),
        description: description.to_string(),
        category: EntryCategory::classify(status),
    })
}

/// Parse every entry of a log file, skipping headers, blank and malformed lines
pub fn parse_log(content: &str) -> Vec<HistoryEntry> {
    let mut entries = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_line(trimmed) {
            Some(entry) => entries.push(entry),
            None => tracing::warn!("Skipping malformed history line {}: {}", index + 1, trimmed),
        }
    }

    entries
}

/// Entries newest first, filtered, and cut to `limit` when given
pub fn build_history(content: &str, filter: HistoryFilter, limit: Option<usize>) -> Vec<HistoryEntry> {
    let mut entries = parse_log(content);
    entries.sort_by_key(|entry| Reverse(entry.timestamp));

    let mut entries: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|entry| entry.category.passes(filter))
        .collect();

    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Text block shown for a history view: banner line followed by one line per entry
pub fn render_history(entries: &[HistoryEntry], filter: HistoryFilter) -> String {
    let mut output = String::new();
    output.push_str(filter.banner());
    output.push_str("\n\n");

    if entries.is_empty() {
        output.push_str("No task history recorded yet.\n");
        return output;
    }

    for entry in entries {
        output.push_str(&entry.to_string());
        output.push('\n');
    }
    output
}
