//! flowdeck - n8n and messaging instance monitoring dashboard
//!
//! A terminal dashboard over two n8n webhook feeds: workflow executions with
//! messaging instance health, and OpenAI token usage.
//!
//! ## Usage
//!
//! ```bash
//! # Start the dashboard
//! flowdeck
//!
//! # With verbose logging
//! flowdeck -v
//!
//! # With an explicit config file
//! flowdeck --config ~/work/flowdeck.yaml
//!
//! # With custom log directory
//! flowdeck --log-dir /path/to/logs/
//! ```
//!
//! Webhook URLs and tuning values come from `~/.flowdeck/config.yaml` and
//! `FLOWDECK_*` environment variables.

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flowdeck_core::logging::default_log_file;
use flowdeck_core::{DashboardConfig, LogGuard, LogOutput, init_logging};
use flowdeck_tui::App;
use tracing::{error, info, warn};

/// flowdeck monitoring dashboard
///
/// Watches n8n executions, workflows, messaging instances and
/// OpenAI token spend from the terminal.
#[derive(Parser, Debug)]
#[command(name = "flowdeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.flowdeck/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Configuration file (defaults to ~/.flowdeck/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let config = match DashboardConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            eprintln!("Error: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("{}", hint);
            }
            return ExitCode::from(if e.is_config_error() { 2 } else { 1 });
        }
    };
    if config.dashboard_webhook_url.is_empty() {
        warn!("dashboard webhook URL is not configured");
    }

    install_panic_hook();

    info!("starting flowdeck");

    match run_app(&config) {
        Ok(()) => {
            info!("flowdeck exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("flowdeck error: {}", e);
            eprintln!("Error: {}", e);
            if cli.log_dir.is_none() {
                if let Ok(path) = default_log_file() {
                    eprintln!("Details in {}", path.display());
                }
            }
            ExitCode::from(1)
        }
    }
}

/// Restore the terminal before the default panic output runs.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    stdout.flush()
}

// the TUI draws on the terminal, so poller warnings go to the log file only
fn setup_logging(cli: &Cli) -> flowdeck_core::Result<LogGuard> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0, LogOutput::FileOnly)
}

fn run_app(config: &DashboardConfig) -> flowdeck_tui::AppResult<()> {
    let mut app = App::new(config)?;
    app.run()
}
