pub mod export;
pub mod generator;

pub use export::{
    clear_exports, export_markdown, list_markdown_files, preview_existing, write_preview,
    MarkdownRenderer, PreformattedRenderer,
};
pub use generator::{generate_markdown, DEFAULT_TRAILING_DAYS};
