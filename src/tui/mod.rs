//! Terminal chat interface.
//!
//! Provides a chat transcript, an assistant-mode side panel and a message
//! input, using ratatui for rendering and crossterm for terminal management.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

mod app;
mod backend;
pub mod event;
mod ui;

pub use app::{App, ChatEntry, ChatMode, Focus, Speaker};
pub use backend::{AgentBackend, ChatBackend};

use crate::config::Config;
use crate::service::RealtorService;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI, even in error
/// cases, to prevent terminal corruption.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic handler.
///
/// Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original
/// hook prints the panic.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// Exits on Ctrl+C. Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, backend: &mut dyn ChatBackend) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, backend, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    backend: &mut dyn ChatBackend,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        // The thinking marker is on screen now; answer before reading keys
        if app.needs_backend() {
            app.process_pending(backend);
            continue;
        }

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
            && event::handle_key_event(app, key)
        {
            break;
        }
    }

    Ok(())
}

/// Entry point for the chat TUI.
///
/// Opens the knowledge base, builds both agents and starts the event loop.
///
/// # Errors
///
/// Returns an error if the knowledge base or agents cannot be created or
/// the terminal fails. Per-message API failures are shown in the transcript
/// instead.
pub fn run(config: &Config) -> Result<()> {
    init_panic_hook();

    let service = RealtorService::from_config(config).context("Failed to start assistant")?;
    let customer = service.customer_agent();
    let enhanced = service.into_memory_agent()?;
    let mut backend = AgentBackend::new(customer, enhanced);

    let mut app = App::new();
    run_event_loop(&mut app, &mut backend).context("TUI event loop failed")?;

    Ok(())
}
