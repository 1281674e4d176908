use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crm_desk::api::{CrmApi, HttpApi};
use crm_desk::app::App;
use crm_desk::config::{self, Cli, Config};
use crm_desk::router::Route;
use crm_desk::session::{Session, SessionStore};
use crm_desk::ui::layout::render_app;

fn init_logging(config: &Config) -> Result<()> {
    if let Some(parent) = config.log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "crm_desk=info".into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::init(&cli)?;
    init_logging(&config)?;
    tracing::info!(api_url = %config.api_url, "starting crm_desk v{}", env!("CARGO_PKG_VERSION"));

    let store = SessionStore::new(&config.session_file);
    if cli.logout {
        store.clear()?;
    }
    let session = match store.load()? {
        Some(token) => Session::with_token(token),
        None => Session::new(),
    };

    let start = match cli.route.as_deref() {
        Some(path) => Route::parse(path).with_context(|| format!("unknown route {}", path))?,
        None => Route::Home,
    };

    let api = HttpApi::new(&config.api_url, config.request_timeout())?;
    let mut app = App::new(api, session, Some(store));

    println!("Connecting to {}...", config.api_url);
    app.restore_session().await;
    app.navigate(start).await;

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "terminal loop failed");
        println!("Error: {}", err);
    }

    tracing::info!("shutting down");
    Ok(())
}

async fn run_app<B: Backend, A: CrmApi>(terminal: &mut Terminal<B>, app: &mut App<A>) -> Result<()> {
    loop {
        terminal.draw(|f| render_app(f, app))?;

        if let Event::Key(key) = event::read()? {
            // crossterm reports releases too on some platforms
            if key.kind == KeyEventKind::Press {
                // raw mode turns Ctrl-C into an ordinary key press
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.quit();
                } else {
                    app.handle_key(key.code).await;
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
