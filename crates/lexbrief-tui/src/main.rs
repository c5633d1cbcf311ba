use std::fs::File;
use std::io::{self, Read};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lexbrief_service::HttpService;
use lexbrief_tui::app::App;
use lexbrief_tui::config::{Cli, Command};
use lexbrief_tui::headless::run_summarize;
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let service = Arc::new(HttpService::new(&cli.server_url));
    runtime.block_on(wait_for_server(&service, cli.connect_timeout()))?;

    match cli.command {
        Some(Command::Summarize { ref file, ref text }) => {
            let text = match text.as_deref() {
                Some("-") => {
                    let mut buf = String::new();
                    io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read stdin")?;
                    Some(buf)
                }
                other => other.map(String::from),
            };
            runtime.block_on(run_summarize(
                service.as_ref(),
                file.as_deref(),
                text.as_deref(),
                cli.word_count.clone(),
                io::stdout(),
            ))?;
            Ok(())
        }
        None => {
            let server_info = match runtime.block_on(service.server_info()) {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("could not fetch server config: {e}");
                    None
                }
            };
            let mut app = App::new(service, runtime.handle().clone(), cli.word_count.clone());
            if let Some(info) = server_info {
                app = app.with_server_info(info);
            }
            run_tui(app)
        }
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.command.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        let path = cli.log_path();
        let file = File::create(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

async fn wait_for_server(service: &HttpService, timeout: Duration) -> Result<()> {
    let start = Instant::now();

    loop {
        match service.health_check().await {
            Ok(()) => {
                info!(url = service.base_url(), "backend reachable");
                return Ok(());
            }
            Err(e) if start.elapsed() > timeout => {
                bail!(
                    "summarizer backend at {} did not become ready within {}s: {e}",
                    service.base_url(),
                    timeout.as_secs()
                );
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(250)).await,
        }
    }
}

fn run_tui(app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|frame| app.render(frame))?;

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Ctrl+C and Ctrl+Q always quit
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
                {
                    break;
                }
                app.handle_key(key);
            }
            Event::Paste(text) => app.handle_paste(&text),
            _ => {}
        }
    }

    Ok(())
}
