//! LazyRedmine - A terminal-based user interface for Redmine
//!
//! This application provides a TUI for browsing, filtering and editing
//! Redmine issues directly from the terminal.

mod api;
mod app;
mod config;
mod edit;
mod error;
mod events;
mod filter;
mod logging;
mod tasks;
mod ui;

use std::io::{self, Stdout};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::{auth, Auth, RedmineClient};
use crate::app::App;
use crate::config::{Config, ServerProfile};
use crate::error::AppError;
use crate::events::{Event, EventHandler};
use crate::tasks::{ApiMessage, TaskSpawner};

type Tui = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug, Parser)]
#[command(name = "lazyredmine", version, about = "A terminal UI for Redmine")]
struct Cli {
    /// Write debug-level logs.
    #[arg(long)]
    debug: bool,

    /// Redmine API key; overrides the config file and keyring.
    #[arg(long, env = "REDMINE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Path to the config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the config file for a Redmine server.
    Setup {
        /// Base URL of the Redmine server.
        #[arg(long)]
        url: String,

        /// Your Redmine API key (My account > API access key).
        #[arg(long)]
        api_key: String,

        /// Keep the key in the OS keyring instead of the config file.
        #[arg(long)]
        store_in_keyring: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug)?;

    let result = match &cli.command {
        Some(Command::Setup {
            url,
            api_key,
            store_in_keyring,
        }) => run_setup(cli.config.clone(), url, api_key, *store_in_keyring),
        None => run(&cli),
    };

    if let Err(e) = &result {
        error!(error = %e, recoverable = e.is_recoverable(), "Exiting with error");
    }
    logging::shutdown();

    if let Err(e) = result {
        eprintln!("{}", e.user_message());
        if let Some(hint) = e.suggested_action() {
            eprintln!("{}", hint);
        }
        if let Some(dir) = logging::log_directory() {
            eprintln!("Logs: {}", dir.display());
        }
        std::process::exit(1);
    }
    Ok(())
}

fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Config::default_path()?),
    }
}

/// Write the config file, optionally moving the key into the keyring.
fn run_setup(
    path: Option<PathBuf>,
    url: &str,
    api_key: &str,
    store_in_keyring: bool,
) -> Result<(), AppError> {
    let path = config_path(path)?;
    let mut profile = ServerProfile::new(url, Some(api_key.to_string()));

    if store_in_keyring {
        auth::store_api_key(url, api_key)?;
        profile.api_key = None;
        info!(url, "API key stored in keyring");
    }

    let config = Config {
        server: profile,
        ..Config::load_from(&path).unwrap_or_default()
    };
    config.save_to(&path)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

/// Pick the API key: command line or environment, then the config file,
/// then the OS keyring.
fn resolve_api_key(explicit: Option<&str>, server: &ServerProfile) -> Result<String, AppError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }
    if let Some(key) = &server.api_key {
        return Ok(key.clone());
    }
    match auth::get_api_key(&server.url) {
        Ok(key) => Ok(key),
        Err(e) => {
            warn!(error = %e, "No API key in keyring");
            Err(AppError::MissingApiKey)
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let path = config_path(cli.config.clone())?;
    let config = Config::load_from(&path)?;
    let api_key = resolve_api_key(cli.api_key.as_deref(), &config.server)?;

    let client = RedmineClient::new(&config.server.url, Auth::new(api_key))?;
    let (mut rx, spawner) = tasks::create_task_channel(client);
    let mut app = App::new(config.server.url.clone(), config.settings.clone());
    let events = EventHandler::with_tick_rate(config.settings.tick_rate_ms);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &events, &spawner, &mut rx);
    restore_terminal()?;
    terminal.show_cursor()?;

    info!("LazyRedmine exiting");
    result
}

fn event_loop(
    terminal: &mut Tui,
    app: &mut App,
    events: &EventHandler,
    spawner: &TaskSpawner,
    rx: &mut mpsc::UnboundedReceiver<ApiMessage>,
) -> Result<(), AppError> {
    let (width, height) = crossterm::terminal::size()?;
    app.update(Event::Resize(width, height));
    spawner.execute_all(app.init());

    loop {
        terminal.draw(|frame| app.view(frame))?;

        let event = events.next()?;
        spawner.execute_all(app.update(event));

        while let Ok(message) = rx.try_recv() {
            spawner.execute_all(app.apply(message));
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}

fn setup_terminal() -> io::Result<Tui> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}
