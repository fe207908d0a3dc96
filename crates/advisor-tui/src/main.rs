use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use advisor_core::{ChatTurnController, Config, MessageLog, WorkerClient};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "Chat with a L'Oréal product and beauty advisor")]
#[command(version)]
struct Cli {
    /// Worker endpoint to send chat requests to
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Write logs to this file (interactive mode only; `ask` logs to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the exchange
    Ask {
        /// Your question
        question: String,
    },
    /// Show or update the saved configuration
    Config {
        /// Endpoint to save
        #[arg(long = "set-endpoint")]
        set_endpoint: Option<String>,
        /// Timeout in seconds to save
        #[arg(long = "set-timeout")]
        set_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?.with_overrides(cli.endpoint.clone(), cli.timeout);

    match cli.command {
        None => {
            let log_file = match cli.log_file {
                Some(path) => path,
                None => Config::app_dir()?.join("advisor.log"),
            };
            init_file_logging(cli.verbose, &log_file)?;
            run_tui(&config).await
        }
        Some(Commands::Ask { question }) => {
            init_stderr_logging(cli.verbose)?;
            ask(&config, &question).await
        }
        Some(Commands::Config {
            set_endpoint,
            set_timeout,
        }) => update_config(set_endpoint, set_timeout),
    }
}

fn log_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

fn init_stderr_logging(verbose: bool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// The terminal belongs to the TUI, so logs go to a file.
fn init_file_logging(verbose: bool, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(verbose))
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    let mut app = App::new(config)?;
    info!(endpoint = config.endpoint(), "Starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

async fn ask(config: &Config, question: &str) -> Result<()> {
    let client = WorkerClient::new(config.endpoint(), config.timeout())?;
    let controller = ChatTurnController::new(client);

    let log = Mutex::new(MessageLog::new());
    log.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .set_input(question);

    let outcome = controller.submit(&log).await;
    info!(?outcome, "Turn complete");

    let log = log.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    for message in log.messages() {
        println!("{}: {}", message.role.label(), message.content);
    }
    Ok(())
}

fn update_config(endpoint: Option<String>, timeout_secs: Option<u64>) -> Result<()> {
    let path = Config::get_config_path()?;
    let mut config = Config::load_from(&path)?;

    if endpoint.is_some() || timeout_secs.is_some() {
        config = config.with_overrides(endpoint, timeout_secs);
        config.save_to(&path)?;
        println!("Saved {}", path.display());
    }

    println!("endpoint: {}", config.endpoint());
    println!("timeout:  {}s", config.timeout().as_secs());
    Ok(())
}
