use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the data directory, both local and in the home directory
pub const DATA_DIR_NAME: &str = ".task_logger";

/// Get the data directory - checks for a local .task_logger first, then falls back to ~/.task_logger
pub fn get_data_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    if let Some(local_dir) = find_local_data_dir(&current_dir) {
        return Ok(local_dir);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DATA_DIR_NAME))
}

/// Find a local data directory by walking up the directory tree
fn find_local_data_dir(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let data_dir = current.join(DATA_DIR_NAME);
        if data_dir.is_dir() {
            return Some(data_dir);
        }
        current = current.parent()?;
    }
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(dir.to_path_buf())
}

/// Initialize a local .task_logger directory in the current directory
pub fn init_local_data_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    let data_dir = current_dir.join(DATA_DIR_NAME);

    if data_dir.exists() {
        anyhow::bail!("Data directory already exists: {}", data_dir.display());
    }

    ensure_dir(&data_dir)
}

/// Atomically write content to a file using temp file + rename
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .context("File path has no parent directory")?;
    ensure_dir(dir)?;

    let mut temp_file = NamedTempFile::new_in(dir).context("Failed to create temporary file")?;
    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Read file content, return empty string if file doesn't exist
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Path of the single-generation backup for `path` (`<name>.bak`)
pub fn backup_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Copy the current file to its `.bak` sibling, replacing any older backup.
/// Returns `None` when there is nothing to back up.
pub fn backup_file<P: AsRef<Path>>(path: P) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let backup = backup_path(path);
    fs::copy(path, &backup)
        .with_context(|| format!("Failed to backup file: {}", path.display()))?;
    Ok(Some(backup))
}

/// Append content to a file, creating it and its directory when missing
pub fn append_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        ensure_dir(dir)?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open file for appending: {}", path.display()))?;

    file.write_all(content.as_bytes())
        .context("Failed to append to file")?;
    file.sync_all().context("Failed to sync file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("nested").join("test.txt");

        atomic_write(&test_file, "Hello, world!").unwrap();
        assert_eq!(read_file(&test_file).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_read_nonexistent_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let content = read_file(temp_dir.path().join("nonexistent.txt")).unwrap();
        assert_eq!(content, "");
    }

    #[test]
    fn test_append_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("exports").join("log.txt");

        append_to_file(&test_file, "Line 1\n").unwrap();
        append_to_file(&test_file, "Line 2\n").unwrap();

        assert_eq!(read_file(&test_file).unwrap(), "Line 1\nLine 2\n");
    }

    #[test]
    fn test_backup_path_appends_extension() {
        let path = Path::new("/tmp/data/task_log.csv");
        assert_eq!(backup_path(path), PathBuf::from("/tmp/data/task_log.csv.bak"));
    }

    #[test]
    fn test_backup_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("task_log.csv");

        assert!(backup_file(&test_file).unwrap().is_none());

        atomic_write(&test_file, "Original content").unwrap();
        let backup = backup_file(&test_file).unwrap().unwrap();
        assert_eq!(read_file(&backup).unwrap(), "Original content");

        atomic_write(&test_file, "Second").unwrap();
        backup_file(&test_file).unwrap();
        assert_eq!(read_file(&backup).unwrap(), "Second");
    }

    #[test]
    fn test_find_local_data_dir_walks_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data_dir = temp_dir.path().join(DATA_DIR_NAME);
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&data_dir).unwrap();
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_local_data_dir(&nested), Some(data_dir));
    }
}
