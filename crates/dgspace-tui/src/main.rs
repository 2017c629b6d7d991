//! DG Space - a terminal client for the DG Space services portal.
//!
//! Sign in with a USD account and browse the request forms for 3D printing
//! and laser cutting. The session survives restarts until you log out or
//! the backend rejects it.

mod app;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dgspace_core::config::{Config, StorageKind};
use dgspace_core::routing::{Navigator, Route};
use dgspace_core::AuthController;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "dgspace.log";

/// Initialize logging to a file in the cache directory.
///
/// The terminal belongs to the UI, so nothing is written to stderr while it
/// runs. Use RUST_LOG to control the level (e.g. RUST_LOG=dgspace_core=debug).
fn init_tracing() -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = Config::cache_dir()?;
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        log_dir, LOG_FILE,
    ));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing()?;
    let mut config = Config::load_or_default();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => return cli_login(config).await,
        Some("--logout") => return cli_logout(&config),
        Some("--whoami") => return cli_whoami(&config).await,
        Some("--ephemeral") => {
            // Session lives only as long as this process.
            config.storage = StorageKind::Memory;
        }
        Some("--help") | Some("-h") => {
            print_usage();
            return Ok(());
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("Unknown argument: {}", other);
        }
        None => {}
    }

    info!("DG Space starting");

    // Create app
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Draw the waiting state before the session is read.
    terminal.draw(|f| render(f, &app))?;
    app.start().await;

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

    info!("DG Space shutting down");
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: dgspace [--ephemeral | --login | --logout | --whoami]");
    eprintln!();
    eprintln!("  (no args)    Start the terminal client");
    eprintln!("  --ephemeral  Start without reading or saving the session");
    eprintln!("  --login      Sign in from the command line");
    eprintln!("  --logout     Forget the saved session");
    eprintln!("  --whoami     Show the signed-in user");
}

fn controller(config: &Config) -> Result<AuthController> {
    AuthController::new(
        config.open_session_store()?,
        Navigator::new(Route::Home),
        &config.api_base_url(),
        config.request_timeout(),
    )
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(email) => print!("USD Email [{}]: ", email),
        None => print!("USD Email: "),
    }
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    let email = email.trim();
    Ok(if email.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        email.to_string()
    })
}

/// Sign in without starting the UI
async fn cli_login(mut config: Config) -> Result<()> {
    let auth = controller(&config)?;
    auth.initialize().await;

    let email = prompt_email(config.last_email.as_deref())?;
    let password = rpassword::prompt_password("Password: ")?;
    if email.is_empty() || password.is_empty() {
        anyhow::bail!(app::MISSING_CREDENTIALS_MESSAGE);
    }

    let profile = auth.login(&email, &password).await?;
    println!("Signed in as {}", profile.display_name());

    config.last_email = Some(email);
    config.save()?;
    Ok(())
}

fn cli_logout(config: &Config) -> Result<()> {
    config.open_session_store()?.clear()?;
    println!("Logged out");
    Ok(())
}

/// Print the stored identity, checking it against the backend.
async fn cli_whoami(config: &Config) -> Result<()> {
    let auth = controller(config)?;
    auth.initialize().await;

    if !auth.is_authenticated() {
        println!("Not signed in");
        return Ok(());
    }

    match auth.refresh_profile().await {
        Ok(profile) => {
            println!("{}", profile.display_name());
            if let Some(email) = &profile.email {
                println!("  email: {}", email);
            }
            if let Some(user_type) = &profile.user_type {
                println!("  type:  {}", user_type);
            }
        }
        Err(dgspace_core::ApiError::SessionExpired) => {
            println!("Session expired. Run `dgspace --login` to sign in again.");
        }
        Err(e) => {
            // Offline: fall back to the stored profile.
            eprintln!("Could not reach the server: {}", e);
            if let Some(profile) = auth.session().profile() {
                println!("{} (cached)", profile.display_name());
            }
        }
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Pick up session changes made outside the input path.
        app.sync_view();

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // A submitted login runs after the disabled form has been drawn.
        if app.login_submitted {
            app.process_pending_login().await;
            continue;
        }

        // Poll for events with timeout
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
