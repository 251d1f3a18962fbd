//! voicedash - A terminal dashboard for voice AI assistants.
//!
//! This application provides a fast, keyboard-driven interface for managing
//! assistants and phone numbers and for reading call transcripts from a
//! voice assistant backend.

mod app;
mod form;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voicedash_core::auth::{MemoryTokenStore, TokenStore};
use voicedash_core::{ApiClient, Config, Session};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the cache directory while the TUI owns the screen
const LOG_FILE: &str = "voicedash.log";

const USAGE: &str = "\
voicedash - terminal dashboard for voice AI assistants

USAGE:
    voicedash [OPTIONS]

OPTIONS:
    --login         Sign in from the command line and store the token
    --logout        Remove the stored token
    --status        Show who is signed in and when the token expires
    --no-persist    Keep the token in memory only for this run
    -h, --help      Print this help

ENVIRONMENT:
    VOICEDASH_API_URL   Backend base URL (default http://localhost:8000)
    RUST_LOG            Log filter (default warn)
";

/// Command-line mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tui,
    Login,
    Logout,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CliArgs {
    command: Command,
    no_persist: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs {
        command: Command::Tui,
        no_persist: false,
        help: false,
    };
    for arg in args {
        let command = match arg.as_str() {
            "--login" => Command::Login,
            "--logout" => Command::Logout,
            "--status" => Command::Status,
            "-h" | "--help" => {
                parsed.help = true;
                continue;
            }
            "--no-persist" => {
                parsed.no_persist = true;
                continue;
            }
            other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
        };
        if parsed.command != Command::Tui {
            anyhow::bail!("Only one of --login, --logout, --status may be given");
        }
        parsed.command = command;
    }
    Ok(parsed)
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
/// The TUI logs to a file so output does not tear the screen; the returned
/// guard must live until exit to flush it.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    if cli.help {
        print!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config ({}), using defaults", e);
        Config::default()
    });
    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));

    let _log_guard = if cli.command == Command::Tui {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        init_tracing(Some(&cache_dir))
    } else {
        init_tracing(None)
    };

    let store: Arc<dyn TokenStore> = if cli.no_persist {
        Arc::new(MemoryTokenStore::new())
    } else {
        config.token_store(cache_dir)
    };
    let session = Session::new(Arc::clone(&store));
    let api = ApiClient::with_timeout(&config.api_url(), store, config.request_timeout_secs())?;
    info!(api_url = %api.base_url(), "voicedash starting");

    match cli.command {
        Command::Login => login_interactive(config, session, &api).await,
        Command::Logout => {
            let mut session = session;
            session.restore();
            session.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            print_status(session, &api);
            Ok(())
        }
        Command::Tui => run_tui(config, session, api).await,
    }
}

/// Sign in from the command line (used for CLI mode)
async fn login_interactive(mut config: Config, mut session: Session, api: &ApiClient) -> Result<()> {
    println!("\n=== voicedash login ({}) ===\n", api.base_url());

    let email = match config.last_email.as_deref() {
        Some(last) => {
            let input = prompt(&format!("Email [{}]: ", last))?;
            if input.is_empty() {
                last.to_string()
            } else {
                input
            }
        }
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");
    let token = api.login(&email, &password).await.map_err(|e| match e.detail() {
        Some(detail) => anyhow::anyhow!("Login failed: {}", detail),
        None => anyhow::anyhow!("Login failed: {}", e),
    })?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    session
        .login(&token)
        .context("Server returned a token that could not be read")?;
    println!("Login successful!");
    print_status(session, api);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn print_status(mut session: Session, api: &ApiClient) {
    session.restore();
    println!("Backend: {}", api.base_url());
    if !session.is_authenticated() {
        println!("Not signed in.");
        return;
    }
    println!("Signed in as: {}", session.subject().unwrap_or("(unknown)"));
    if let Some(expires) = session.expires_at() {
        println!(
            "Token expires: {} ({} min left)",
            expires.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
            session.minutes_until_expiry()
        );
    }
}

async fn run_tui(config: Config, session: Session, api: ApiClient) -> Result<()> {
    info!("voicedash TUI starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let config_path = Config::config_path().ok();
    let mut app = App::new(config, config_path, session, api);

    // First frame shows the session check placeholder
    terminal.draw(|f| render(f, &app))?;
    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("voicedash TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.enforce_guard();
        app.tick();

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
