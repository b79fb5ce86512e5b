mod app;
mod config;
mod executor;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use task_core::{Store, TaskClient};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::app::Screen;
use crate::config::Config;
use crate::executor::Executor;

#[derive(Parser)]
#[command(name = "tasks")]
#[command(about = "Terminal client for the task board API")]
#[command(version)]
struct Cli {
    /// API root, e.g. http://localhost:8080/api
    #[arg(long, env = "TASKS_API_URL")]
    api_url: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(long, env = "TASKS_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Write logs here; without it logs are discarded
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolve(self, mut config: Config) -> Config {
        if let Some(api_url) = self.api_url {
            config.api_url = api_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
        config
    }
}

/// The terminal owns stdout and stderr, so logs only go to a file.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let loaded = config::load(cli.config.as_deref())?;
    let config = cli.resolve(loaded.config);
    init_tracing(verbose, config.log_file.as_deref())?;
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "config loaded"),
        None => debug!("no config file, using defaults"),
    }
    info!(api_url = %config.api_url, timeout_secs = config.timeout_secs, "starting tasks");

    let executor = Executor::spawn(config.timeout())?;
    let mut screen = Screen::new(Store::new(TaskClient::new(&config.api_url)));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = app::run(&mut terminal, &mut screen, &executor);

    // Restore the terminal even if the loop failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
