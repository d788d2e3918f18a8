use crate::domain::{format_minutes, format_timestamp, Clock, Completed, HistoryFilter, LogEvent, TaskRecord};
use crate::error::{TaskError, TaskResult};
use crate::history::{build_history, HistoryEntry};
use crate::persistence::{ensure_dir, with_duration, EventLog, Field, Paths, TaskQuery, TaskStore};
use crate::report::{self, MarkdownRenderer};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Result of a successful lifecycle operation
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub message: String,
    /// Durations (minutes) of the records closed by the operation
    pub durations: Vec<f64>,
}

impl Outcome {
    fn new(message: String) -> Self {
        Self {
            message,
            durations: Vec::new(),
        }
    }
}

/// Task lifecycle over the table, mirrored into the event log
pub struct TaskLogger {
    store: TaskStore,
    log: EventLog,
    clock: Box<dyn Clock>,
}

impl TaskLogger {
    pub fn new(store: TaskStore, log: EventLog, clock: Box<dyn Clock>) -> Self {
        Self { store, log, clock }
    }

    /// Load the table from `paths`, seeding the event log when it is missing
    pub fn open(paths: &Paths, clock: Box<dyn Clock>) -> Result<Self> {
        ensure_dir(&paths.data_dir)?;
        ensure_dir(&paths.exports_dir)?;

        let store = TaskStore::load(&paths.csv_file)?;
        let log = EventLog::new(&paths.event_log);
        if let Err(e) = log.seed_from_table(store.records(), clock.now()) {
            tracing::error!("Error creating initial log file: {:#}", e);
        }

        Ok(Self::new(store, log, clock))
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Start a task, or add the note to it when it is already active
    pub fn start(&mut self, description: &str, note: &str) -> TaskResult<Outcome> {
        let description = require(description, "task description")?;
        let now = self.clock.now();

        let active = self
            .store
            .query(&TaskQuery::new().active(true).description(description));
        if let Some(&row) = active.last() {
            if note.trim().is_empty() {
                return Ok(Outcome::new(format!("Task '{}' is already active.", description)));
            }

            if let Some(record) = self.store.record_mut(row) {
                record.append_note(note);
                record.updated = format_timestamp(now);
            }
            self.persist()?;
            self.log_event(LogEvent::NoteAdded, now, description);
            return Ok(Outcome::new(format!(
                "Task '{}' is already active. Note added.",
                description
            )));
        }

        self.store.push(TaskRecord::start(description, note, now));
        self.persist()?;
        self.log_event(LogEvent::Started, now, description);
        tracing::info!("Started task '{}'", description);

        Ok(Outcome::new(format!("Started task: {}", description)))
    }

    /// Stop the most recently added active record with this description
    pub fn stop(&mut self, description: &str, note: &str) -> TaskResult<Outcome> {
        let description = require(description, "task description")?;
        let now = self.clock.now();

        let row = self
            .store
            .query(&TaskQuery::new().active(true).description(description))
            .last()
            .copied()
            .ok_or_else(|| TaskError::NotFound("No active task found with that name".to_string()))?;

        let record = self
            .store
            .record_mut(row)
            .ok_or_else(|| TaskError::NotFound("No active task found with that name".to_string()))?;
        let duration = record.close(now, false);
        record.append_note(note);

        self.persist()?;
        self.log_event(LogEvent::Stopped, now, &with_duration(description, duration));
        tracing::info!("Stopped task '{}' after {} minutes", description, duration);

        Ok(Outcome {
            message: format!("Stopped task: {} ({})", description, format_minutes(duration)),
            durations: vec![duration],
        })
    }

    /// Complete every active record with this description. Stale data can
    /// hold more than one; each gets its own duration and log entry.
    pub fn finish(&mut self, description: &str, note: &str) -> TaskResult<Outcome> {
        let description = require(description, "task description")?;
        let now = self.clock.now();

        let rows = self
            .store
            .query(&TaskQuery::new().active(true).description(description));
        if rows.is_empty() {
            return Err(TaskError::NotFound(format!(
                "No active task found with name: {}",
                description
            )));
        }

        let mut durations = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(record) = self.store.record_mut(row) {
                durations.push(record.close(now, true));
                record.append_note(note);
            }
        }

        self.persist()?;
        for duration in &durations {
            self.log_event(LogEvent::Finished, now, &with_duration(description, *duration));
        }
        tracing::info!("Finished {} record(s) of '{}'", durations.len(), description);

        Ok(Outcome {
            message: format!("Marked '{}' as completed.", description),
            durations,
        })
    }

    /// Append a note to the first record with this description.
    ///
    /// Only the first match is updated, even when later records share the
    /// description.
    pub fn add_note(
        &mut self,
        description: &str,
        note: &str,
        timestamp: Option<NaiveDateTime>,
    ) -> TaskResult<Outcome> {
        let description = require(description, "task description")?;
        let note = require(note, "note")?;
        let when = timestamp.unwrap_or_else(|| self.clock.now());

        let row = self
            .store
            .query(&TaskQuery::new().description(description))
            .first()
            .copied()
            .ok_or_else(|| {
                TaskError::NotFound(format!(
                    "No tasks found matching description: '{}'",
                    description
                ))
            })?;

        if let Some(record) = self.store.record_mut(row) {
            record.append_note(note);
            record.updated = format_timestamp(when);
        }
        self.persist()?;
        self.log_event(LogEvent::NoteAdded, when, description);
        tracing::debug!("Added note to '{}'", description);

        Ok(Outcome::new(format!("Note added to '{}'", description)))
    }

    /// `(start_time, description)` of active records, oldest start first
    pub fn active_tasks(&self) -> Vec<(String, String)> {
        self.listing(&TaskQuery::new().active(true))
    }

    /// `(start_time, description)` of completed records, oldest start first
    pub fn finished_tasks(&self) -> Vec<(String, String)> {
        self.listing(&TaskQuery::new().active(false).completed(Completed::Yes))
    }

    fn listing(&self, query: &TaskQuery<'_>) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = self
            .store
            .query(query)
            .into_iter()
            .filter_map(|row| {
                let start_time = self.store.get_field(row, Field::StartTime)?;
                let description = self.store.get_field(row, Field::Description)?;
                Some((start_time, description))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Every note of every record with this description, as blockquote lines
    pub fn task_notes(&self, description: &str) -> String {
        let notes: Vec<String> = self
            .store
            .query(&TaskQuery::new().description(description.trim()))
            .into_iter()
            .filter_map(|row| self.store.record(row))
            .flat_map(|record| record.note_entries())
            .map(|note| format!("> {}", note))
            .collect();

        if notes.is_empty() {
            "No notes available.".to_string()
        } else {
            notes.join("\n")
        }
    }

    /// Log-derived history, newest first
    pub fn history(&self, filter: HistoryFilter, limit: Option<usize>) -> TaskResult<Vec<HistoryEntry>> {
        let content = self
            .log
            .read()
            .map_err(|e| TaskError::Report(format!("Error refreshing history: {:#}", e)))?;
        Ok(build_history(&content, filter, limit))
    }

    /// Weekly summary markdown for the trailing window ending now
    pub fn report(&self, trailing_days: i64, author: &str) -> TaskResult<String> {
        report::generate_markdown(self.store.records(), self.clock.now(), trailing_days, author)
    }

    pub fn export_report(&self, dir: &Path, trailing_days: i64, author: &str) -> TaskResult<PathBuf> {
        let markdown = self.report(trailing_days, author)?;
        report::export_markdown(dir, &markdown, self.clock.now())
    }

    /// Export the summary, then write its HTML preview; returns the preview path
    pub fn preview_report(
        &self,
        dir: &Path,
        trailing_days: i64,
        author: &str,
        renderer: &dyn MarkdownRenderer,
    ) -> TaskResult<PathBuf> {
        let markdown = self.report(trailing_days, author)?;
        let now = self.clock.now();
        report::export_markdown(dir, &markdown, now)?;
        report::write_preview(dir, &markdown, now, renderer)
    }

    /// Remove generated exports and record the action in the event log
    pub fn clear_exports(&self, dir: &Path) -> TaskResult<Outcome> {
        let removed = report::clear_exports(dir)?;
        let summary = format!("{} file(s) removed", removed);
        self.log_event(LogEvent::ExportsCleared, self.clock.now(), &summary);
        Ok(Outcome::new(format!("Cleared exports: {}", summary)))
    }

    fn persist(&self) -> TaskResult<()> {
        if self.store.save() {
            Ok(())
        } else {
            Err(TaskError::PersistenceFailure(self.store.path().to_path_buf()))
        }
    }

    /// The log mirrors the table; a failed append is reported but does not
    /// undo the saved change.
    fn log_event(&self, event: LogEvent, timestamp: NaiveDateTime, description: &str) {
        if let Err(e) = self.log.append(event, timestamp, description) {
            tracing::error!("Error appending to log: {:#}", e);
        }
    }
}

fn require<'a>(text: &'a str, what: &'static str) -> TaskResult<&'a str> {
    let text = text.trim();
    if text.is_empty() {
        Err(TaskError::EmptyInput(what))
    } else {
        Ok(text)
    }
}
