use std::fmt;

/// Whether a task was explicitly finished (distinct from merely stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completed {
    Yes,
    #[default]
    No,
}

impl Completed {
    /// Parse a `Completed` cell. Anything other than "yes" counts as `No`.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().eq_ignore_ascii_case("yes") {
            Self::Yes
        } else {
            Self::No
        }
    }

    pub fn as_cell(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// Status filter applied to the rendered history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Active,
    Finished,
}

impl HistoryFilter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }

    /// Banner shown above the filtered history
    pub fn banner(&self) -> &'static str {
        match self {
            Self::All => "Showing all task events",
            Self::Active => "Showing active tasks only",
            Self::Finished => "Showing finished tasks only",
        }
    }
}

/// Display category of a history entry, derived from its status text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCategory {
    Active,
    Note,
    Administrative,
    Completed,
}

impl EntryCategory {
    /// Classify a status string. "In Progress" is checked first.
    pub fn classify(status: &str) -> Self {
        if status.contains("In Progress") {
            Self::Active
        } else if status.contains("Notes") {
            Self::Note
        } else if status.contains("Clear Export") {
            Self::Administrative
        } else {
            Self::Completed
        }
    }

    pub fn passes(&self, filter: HistoryFilter) -> bool {
        match filter {
            HistoryFilter::All => true,
            HistoryFilter::Active => *self == Self::Active,
            HistoryFilter::Finished => *self == Self::Completed,
        }
    }
}

/// Lifecycle transitions mirrored into the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    Started,
    Stopped,
    Finished,
    NoteAdded,
    ExportsCleared,
}

impl LogEvent {
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Started => "▶️",
            Self::Stopped => "⏹️",
            Self::Finished => "✅",
            Self::NoteAdded => "ℹ️",
            Self::ExportsCleared => "🧹",
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Started => "In Progress",
            Self::Stopped => "Stopped",
            Self::Finished => "Completed",
            Self::NoteAdded => "Notes Added",
            Self::ExportsCleared => "Clear Export",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_from_cell() {
        assert_eq!(Completed::from_cell("Yes"), Completed::Yes);
        assert_eq!(Completed::from_cell(" yes "), Completed::Yes);
        assert_eq!(Completed::from_cell("No"), Completed::No);
        assert_eq!(Completed::from_cell(""), Completed::No);
        assert_eq!(Completed::from_cell("maybe"), Completed::No);
    }

    #[test]
    fn test_history_filter_from_name() {
        assert_eq!(HistoryFilter::from_name("all"), Some(HistoryFilter::All));
        assert_eq!(HistoryFilter::from_name("Active"), Some(HistoryFilter::Active));
        assert_eq!(HistoryFilter::from_name("FINISHED"), Some(HistoryFilter::Finished));
        assert_eq!(HistoryFilter::from_name("done"), None);
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(EntryCategory::classify("In Progress"), EntryCategory::Active);
        assert_eq!(EntryCategory::classify("Notes Added"), EntryCategory::Note);
        assert_eq!(EntryCategory::classify("Notes Updated"), EntryCategory::Note);
        assert_eq!(EntryCategory::classify("Clear Export"), EntryCategory::Administrative);
        assert_eq!(EntryCategory::classify("Completed"), EntryCategory::Completed);
        assert_eq!(EntryCategory::classify("Stopped"), EntryCategory::Completed);
        assert_eq!(EntryCategory::classify("Started"), EntryCategory::Completed);
    }

    #[test]
    fn test_finished_filter_excludes_non_completions() {
        for category in [
            EntryCategory::Active,
            EntryCategory::Note,
            EntryCategory::Administrative,
        ] {
            assert!(!category.passes(HistoryFilter::Finished));
            assert!(category.passes(HistoryFilter::All));
        }
        assert!(EntryCategory::Completed.passes(HistoryFilter::Finished));
        assert!(!EntryCategory::Completed.passes(HistoryFilter::Active));
    }

    #[test]
    fn test_log_event_labels() {
        assert_eq!(LogEvent::Started.status(), "In Progress");
        assert_eq!(LogEvent::Finished.to_string(), "Completed");
        assert_eq!(LogEvent::ExportsCleared.status(), "Clear Export");
    }
}
