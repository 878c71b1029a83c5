mod state;
mod stream;
mod theme;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{App, Config};
use std::io;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const COMMAND_QUEUE_CAPACITY: usize = 16;
const STREAM_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    init_logging();

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (stream_tx, mut stream_rx) = mpsc::channel(STREAM_QUEUE_CAPACITY);
    let mut app = App::new(config.clone(), command_tx);

    tokio::spawn(async move {
        stream::stream_loop(config, stream_tx, command_rx).await;
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        tokio::select! {
            Some(event) = stream_rx.recv() => {
                app.apply_stream_event(event);
            }
            maybe_event = events.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key);
                    }
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn load_config() -> Config {
    Config {
        server_addr: resolve_server_addr(),
        username: resolve_username(),
    }
}

fn resolve_server_addr() -> String {
    if let Ok(value) = std::env::var("CANDASH_SERVER_ADDR") {
        if !value.trim().is_empty() {
            return value;
        }
    }
    "127.0.0.1:8000".to_string()
}

fn resolve_username() -> String {
    if let Ok(value) = std::env::var("CANDASH_USERNAME") {
        if !value.trim().is_empty() {
            return value;
        }
    }
    if let Ok(value) = std::env::var("USER") {
        if !value.trim().is_empty() {
            return value;
        }
    }
    "console".to_string()
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("CANDASH_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    // The TUI owns the terminal; logs go nowhere unless explicitly
    // requested.
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
