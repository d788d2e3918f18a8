mod app;
mod domain;
mod error;
mod history;
mod logging;
mod persistence;
mod report;

use anyhow::{Context, Result};
use app::TaskLogger;
use clap::{Parser, Subcommand};
use domain::{format_minutes, HistoryFilter, SystemClock};
use persistence::{ensure_dir, get_data_dir, init_local_data_dir, load_config, save_config, Config, Paths, CONFIG_FILE};
use report::PreformattedRenderer;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "task-logger")]
#[command(about = "Track named tasks and generate weekly markdown summaries", long_about = None)]
struct Cli {
    /// Data directory. Defaults to the nearest .task_logger, then ~/.task_logger
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Diagnostic log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .task_logger directory in the current directory
    Init,
    /// Start a task, or add a note to it if it is already running
    Start {
        description: String,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Stop a running task
    Stop {
        description: String,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Mark a running task as completed
    Finish {
        description: String,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Add a note to a task
    Note {
        description: String,
        text: String,
        /// Timestamp for the note (YYYY-MM-DD HH:MM). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// List running tasks
    Active,
    /// List completed tasks
    Finished,
    /// Show every note recorded for a task
    Notes { description: String },
    /// List the most recently touched tasks
    Recent {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the task history from the event log
    History {
        /// all, active or finished
        #[arg(short, long, default_value = "all")]
        filter: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Generate the weekly summary and export it as markdown
    Report {
        /// Trailing window in days
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..))]
        days: Option<i64>,
        /// Print the summary instead of exporting it
        #[arg(long)]
        stdout: bool,
    },
    /// Write an HTML preview of the current summary, or of an exported file
    Preview { file: Option<String> },
    /// List exported summaries
    Exports,
    /// Remove exported summaries and previews
    ClearExports,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        let data_dir = init_local_data_dir()?;
        save_config(data_dir.join(CONFIG_FILE), &Config::default())?;
        println!("Initialized task logger directory: {}", data_dir.display());
        return Ok(());
    }

    let data_dir = match cli.dir {
        Some(dir) => dir,
        None => get_data_dir()?,
    };
    ensure_dir(&data_dir)?;
    let config = load_config(data_dir.join(CONFIG_FILE))?;
    let paths = Paths::new(&data_dir, &config);

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = logging::resolve_filter(cli.log_level, rust_log.as_deref(), &config.log_level);
    logging::enable_logging(&paths.logs_dir, filter)?;
    tracing::debug!("Using data directory {}", data_dir.display());

    let mut logger = TaskLogger::open(&paths, Box::new(SystemClock))?;

    match cli.command {
        Commands::Init => {}
        Commands::Start { description, note } => {
            println!("{}", logger.start(&description, &note)?.message);
        }
        Commands::Stop { description, note } => {
            println!("{}", logger.stop(&description, &note)?.message);
        }
        Commands::Finish { description, note } => {
            let outcome = logger.finish(&description, &note)?;
            println!("{}", outcome.message);
            for duration in outcome.durations {
                println!("  {}", format_minutes(duration));
            }
        }
        Commands::Note {
            description,
            text,
            at,
        } => {
            let timestamp = at
                .map(|stamp| domain::parse_timestamp(&stamp))
                .transpose()?;
            println!("{}", logger.add_note(&description, &text, timestamp)?.message);
        }
        Commands::Active => print_listing(&logger.active_tasks(), "No active tasks."),
        Commands::Finished => print_listing(&logger.finished_tasks(), "No finished tasks."),
        Commands::Notes { description } => {
            println!("{}", logger.task_notes(&description));
        }
        Commands::Recent { limit } => {
            let records = logger.store().recent(limit);
            if records.is_empty() {
                println!("No tasks recorded yet.");
            }
            for record in records {
                let state = if record.active {
                    "active"
                } else if record.completed.is_yes() {
                    "completed"
                } else {
                    "stopped"
                };
                println!("{}  {} ({})", record.start_time, record.description, state);
            }
        }
        Commands::History { filter, limit } => {
            let filter = HistoryFilter::from_name(&filter)
                .with_context(|| format!("Unknown history filter '{}'", filter))?;
            let entries = logger.history(filter, limit.or(Some(config.history_limit)))?;
            print!("{}", history::render_history(&entries, filter));
        }
        Commands::Report { days, stdout } => {
            let days = days.unwrap_or(config.report_days);
            if stdout {
                print!("{}", logger.report(days, &config.author_name)?);
            } else {
                let path = logger.export_report(&paths.exports_dir, days, &config.author_name)?;
                println!("Weekly summary exported to {}", path.display());
            }
        }
        Commands::Preview { file } => {
            let path = match file {
                Some(file) => report::preview_existing(
                    &paths.exports_dir,
                    &file,
                    logger.now(),
                    &PreformattedRenderer,
                )?,
                None => logger.preview_report(
                    &paths.exports_dir,
                    config.report_days,
                    &config.author_name,
                    &PreformattedRenderer,
                )?,
            };
            println!("Preview written to {}", path.display());
        }
        Commands::Exports => {
            let files = report::list_markdown_files(&paths.exports_dir);
            if files.is_empty() {
                println!("No exported summaries.");
            }
            for file in files {
                println!("{}", file);
            }
        }
        Commands::ClearExports => {
            println!("{}", logger.clear_exports(&paths.exports_dir)?.message);
        }
    }

    Ok(())
}

fn print_listing(rows: &[(String, String)], empty_message: &str) {
    if rows.is_empty() {
        println!("{}", empty_message);
        return;
    }
    for (start_time, description) in rows {
        println!("{}  {}", start_time, description);
    }
}
