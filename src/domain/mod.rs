pub mod clock;
pub mod enums;
pub mod record;

pub use clock::{Clock, SystemClock};
pub use enums::{Completed, EntryCategory, HistoryFilter, LogEvent};
pub use record::{format_minutes, format_timestamp, parse_timestamp, TaskRecord, COLUMNS};
