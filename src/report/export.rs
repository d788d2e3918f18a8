use crate::error::{TaskError, TaskResult};
use crate::persistence::{atomic_write, read_file};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Turns report markdown into an HTML fragment for the preview page
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

/// Shows the markdown source verbatim inside a `<pre>` block
pub struct PreformattedRenderer;

impl MarkdownRenderer for PreformattedRenderer {
    fn render(&self, markdown: &str) -> String {
        format!("<pre class=\"markdown\">{}</pre>", escape_html(markdown))
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const PREVIEW_STYLE: &str = "\
        body { font-family: Arial, sans-serif; margin: 40px; line-height: 1.6; color: #000; }
        h1 { color: #2c3e50; border-bottom: 2px solid #4287f5; padding-bottom: 10px; }
        h2 { color: #34495e; border-bottom: 1px solid #ddd; padding-bottom: 5px; margin-top: 30px; }
        h3 { color: #3498db; margin-top: 20px; margin-bottom: 10px; }
        ul { padding-left: 20px; margin-bottom: 0 !important; }
        li { margin-bottom: 0 !important; }
        pre.markdown { white-space: pre-wrap; font-family: inherit; }
";

/// Wrap a rendered fragment in the styled preview page
pub fn wrap_html(body: &str) -> String {
    format!(
        "<html>\n<head>\n    <meta charset=\"utf-8\">\n    <style>\n{}    </style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        PREVIEW_STYLE, body
    )
}

/// File name of the markdown export for the day of `now`
pub fn summary_file_name(now: NaiveDateTime) -> String {
    format!("{}_weekly_summary.md", now.format("%Y-%m-%d"))
}

/// File name of a preview page, unique per second
pub fn preview_file_name(now: NaiveDateTime) -> String {
    format!("temp_preview_{}.html", now.format("%Y%m%d%H%M%S"))
}

/// Write the report to `<dir>/<YYYY-MM-DD>_weekly_summary.md`
pub fn export_markdown(dir: &Path, markdown: &str, now: NaiveDateTime) -> TaskResult<PathBuf> {
    let path = dir.join(summary_file_name(now));
    atomic_write(&path, markdown)
        .map_err(|e| TaskError::Report(format!("Error exporting to markdown: {:#}", e)))?;
    tracing::info!("Exported weekly summary to {}", path.display());
    Ok(path)
}

/// Render `markdown` into a timestamped HTML preview page and return its path
pub fn write_preview(
    dir: &Path,
    markdown: &str,
    now: NaiveDateTime,
    renderer: &dyn MarkdownRenderer,
) -> TaskResult<PathBuf> {
    let path = dir.join(preview_file_name(now));
    let html = wrap_html(&renderer.render(markdown));
    atomic_write(&path, &html)
        .map_err(|e| TaskError::Report(format!("Error generating preview: {:#}", e)))?;
    tracing::debug!("Wrote preview {}", path.display());
    Ok(path)
}

/// Markdown files in the export directory, sorted by name
pub fn list_markdown_files(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".md"))
        .collect();
    files.sort();
    files
}

/// Preview an earlier export. Only the base name of `filename` is used, so
/// lookups cannot leave the export directory.
pub fn preview_existing(
    dir: &Path,
    filename: &str,
    now: NaiveDateTime,
    renderer: &dyn MarkdownRenderer,
) -> TaskResult<PathBuf> {
    let basename = Path::new(filename)
        .file_name()
        .ok_or_else(|| TaskError::NotFound(format!("File not found: {}", filename)))?;
    let path = dir.join(basename);
    if !path.is_file() {
        return Err(TaskError::NotFound(format!("File not found: {}", path.display())));
    }

    let markdown = read_file(&path)
        .map_err(|e| TaskError::Report(format!("Error generating preview: {:#}", e)))?;
    write_preview(dir, &markdown, now, renderer)
}

/// Remove generated markdown and HTML files, returning how many were removed.
/// Other files (such as the event log) are left alone.
pub fn clear_exports(dir: &Path) -> TaskResult<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(0),
    };

    let mut removed = 0;
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let generated = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "md" || ext == "html");
        if !generated || !path.is_file() {
            continue;
        }

        fs::remove_file(&path).map_err(|e| {
            TaskError::Report(format!("Error clearing {}: {}", path.display(), e))
        })?;
        removed += 1;
    }

    tracing::info!("Removed {} exported file(s) from {}", removed, dir.display());
    Ok(removed)
}
