use super::files::{atomic_write, backup_file, read_file};
use crate::domain::{Completed, TaskRecord, COLUMNS};
use anyhow::{Context, Result};
use std::cmp::Reverse;
use std::path::{Path, PathBuf};

/// Position of a record in the table (stable: rows are never removed)
pub type RowId = usize;

/// Addressable columns of a task record. Variants follow `COLUMNS` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Description,
    StartTime,
    StopTime,
    Duration,
    Completed,
    Notes,
    Active,
    Updated,
}

/// Row filter. Every supplied filter must match; `None` passes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskQuery<'a> {
    pub active: Option<bool>,
    pub completed: Option<Completed>,
    pub description: Option<&'a str>,
}

impl<'a> TaskQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn completed(mut self, completed: Completed) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn description(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn matches(&self, record: &TaskRecord) -> bool {
        self.active.map_or(true, |active| record.active == active)
            && self.completed.map_or(true, |completed| record.completed == completed)
            && self
                .description
                .map_or(true, |description| record.description == description)
    }
}

/// The task table, mirrored to a CSV file that is rewritten on every save
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    records: Vec<TaskRecord>,
    /// Columns found in the file beyond the fixed schema, kept on save
    extra_columns: Vec<String>,
}

impl TaskStore {
    /// Load the table, creating the file when absent and adding any missing
    /// columns. The file is written back whenever the schema changed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();

        let content = read_file(&path)?;
        let table = parse_table(&content)
            .with_context(|| format!("Failed to parse task table: {}", path.display()))?;
        let schema_changed = table.schema_changed;

        let store = Self {
            path,
            records: table.records,
            extra_columns: table.extra_columns,
        };
        tracing::debug!(
            "Loaded {} task records from {}",
            store.records.len(),
            store.path.display()
        );

        if !existed || schema_changed {
            if existed {
                tracing::info!("Adding missing columns to {}", store.path.display());
            }
            store.write_table()?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Back up the previous file, then overwrite it. Failures are logged and
    /// reported as `false`; a failed backup does not block the save.
    pub fn save(&self) -> bool {
        if let Err(e) = backup_file(&self.path) {
            tracing::warn!("Error creating backup: {:#}", e);
        }

        match self.write_table() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error saving data: {:#}", e);
                false
            }
        }
    }

    fn write_table(&self) -> Result<()> {
        let content = serialize_table(&self.records, &self.extra_columns)?;
        atomic_write(&self.path, &content)?;
        tracing::debug!(
            "Wrote {} task records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Row ids matching the query, in table order
    pub fn query(&self, query: &TaskQuery<'_>) -> Vec<RowId> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| query.matches(record))
            .map(|(row, _)| row)
            .collect()
    }

    /// Value of one cell, `None` for an unknown row
    pub fn get_field(&self, row: RowId, field: Field) -> Option<String> {
        let record = self.records.get(row)?;
        record.cells().into_iter().nth(field as usize)
    }

    /// Append a record; its extra cells are padded to the table's extra columns
    pub fn push(&mut self, mut record: TaskRecord) -> RowId {
        record.extra.resize(self.extra_columns.len(), String::new());
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn record(&self, row: RowId) -> Option<&TaskRecord> {
        self.records.get(row)
    }

    pub fn record_mut(&mut self, row: RowId) -> Option<&mut TaskRecord> {
        self.records.get_mut(row)
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recently touched records first (later of start/stop time)
    pub fn recent(&self, limit: usize) -> Vec<&TaskRecord> {
        let mut records: Vec<&TaskRecord> = self.records.iter().collect();
        records.sort_by_key(|record| Reverse(record.last_activity()));
        records.truncate(limit);
        records
    }
}

/// Records read from a table file
#[derive(Debug, Default)]
pub struct ParsedTable {
    pub records: Vec<TaskRecord>,
    /// Header names outside the fixed schema, in file order
    pub extra_columns: Vec<String>,
    /// Whether any fixed column was missing from the header
    pub schema_changed: bool,
}

/// Parse CSV content into records. Unknown columns are carried in each
/// record's `extra` cells so they survive the next save.
pub fn parse_table(content: &str) -> Result<ParsedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read header row")?.clone();
    let schema_changed = COLUMNS
        .iter()
        .any(|column| !headers.iter().any(|header| header.trim() == *column));

    let extra_indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !COLUMNS.contains(&header.trim()))
        .map(|(index, _)| index)
        .collect();
    let extra_columns = extra_indices
        .iter()
        .map(|&index| headers[index].to_string())
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let parsed = row
            .map_err(anyhow::Error::from)
            .and_then(|row| Ok((row.deserialize::<TaskRecord>(Some(&headers))?, row)));
        match parsed {
            Ok((mut record, row)) => {
                record.extra = extra_indices
                    .iter()
                    .map(|&column| row.get(column).unwrap_or_default().to_string())
                    .collect();
                records.push(record);
            }
            Err(e) => tracing::warn!("Skipping unreadable task row {}: {}", index + 1, e),
        }
    }

    Ok(ParsedTable {
        records,
        extra_columns,
        schema_changed,
    })
}

/// Serialize records with the fixed header row (written even for an empty
/// table), followed by any extra columns
pub fn serialize_table(records: &[TaskRecord], extra_columns: &[String]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(
        COLUMNS
            .iter()
            .copied()
            .chain(extra_columns.iter().map(String::as_str)),
    )?;
    for record in records {
        let cells = record.cells();
        let extra = (0..extra_columns.len())
            .map(|index| record.extra.get(index).map(String::as_str).unwrap_or(""));
        writer.write_record(cells.iter().map(String::as_str).chain(extra))?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("Task table is not valid UTF-8")
}
