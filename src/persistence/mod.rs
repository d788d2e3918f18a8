pub mod config;
pub mod event_log;
pub mod files;
pub mod store;

pub use config::{load_config, save_config, Config, Paths, CONFIG_FILE};
pub use event_log::{with_duration, EventLog};
pub use files::{atomic_write, ensure_dir, get_data_dir, init_local_data_dir, read_file};
pub use store::{Field, TaskQuery, TaskStore};
