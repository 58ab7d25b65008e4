// src/ui/mod.rs

//! Interactive terminal interface
//!
//! A menu-driven front end over the same [`PackageManager`] operations the
//! command line uses. Each long-running operation executes on its own worker
//! thread and streams [`ProgressEvent`]s back over a bounded channel, so the
//! event loop keeps drawing while git and hook scripts run.
//!
//! # Module Structure
//!
//! - `state` - screens and key handling (no terminal dependencies)
//! - `render` - layout and widgets

mod render;
pub mod state;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::lifecycle::{Operation, PackageManager};
use crate::progress::{self, CHANNEL_CAPACITY, ProgressEvent};
use crate::theme::Theme;

pub use state::{AppState, Effect, MENU, MenuAction, Screen};

/// Redraw and input polling interval
const TICK: Duration = Duration::from_millis(100);

/// Operation running on a background thread
struct Worker {
    receiver: Receiver<ProgressEvent>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn(manager: Arc<PackageManager>, operation: Operation) -> io::Result<Self> {
        let (mut sink, receiver) = progress::channel(CHANNEL_CAPACITY);
        let handle = thread::Builder::new()
            .name("zcr-worker".to_string())
            .spawn(move || {
                debug!("Worker started: {}", operation);
                // The result also arrives as the terminal event on the channel
                let _ = manager.run(&operation, &mut sink);
                debug!("Worker finished: {}", operation);
            })?;
        Ok(Self { receiver, handle })
    }
}

/// Terminal session for the interactive interface
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
}

impl Tui {
    /// Switch the terminal to raw mode on the alternate screen
    pub fn new(theme: Theme) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal, theme })
    }

    /// Restore the terminal to its original state
    pub fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn draw(&mut self, state: &AppState) -> io::Result<()> {
        let theme = self.theme;
        self.terminal
            .draw(|frame| render::render_ui(frame, state, &theme))?;
        Ok(())
    }

    /// Run the event loop until the user quits
    pub fn run(&mut self, manager: Arc<PackageManager>) -> io::Result<()> {
        info!("Starting interactive interface");
        let mut state = AppState::new();
        let mut worker: Option<Worker> = None;

        loop {
            self.draw(&state)?;

            if let Some(active) = worker.take() {
                worker = self.drain(active, &mut state)?;
            }

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match state.handle_key(key) {
                            Effect::None => {}
                            Effect::Quit => break,
                            Effect::Start(operation) => {
                                info!("Starting {}", operation);
                                worker = Some(Worker::spawn(Arc::clone(&manager), operation)?);
                            }
                        }
                    }
                }
            }

            state.tick();
        }

        if worker.is_some() {
            warn!("Leaving interactive interface with an operation still running");
        }
        info!("Interactive interface closed");
        Ok(())
    }

    /// Apply pending events; returns the worker while it is still running
    fn drain(&mut self, worker: Worker, state: &mut AppState) -> io::Result<Option<Worker>> {
        loop {
            match worker.receiver.try_recv() {
                Ok(event) => {
                    if state.handle_progress(event) {
                        self.finish(worker)?;
                        return Ok(None);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(Some(worker)),
                Err(TryRecvError::Disconnected) => {
                    state.handle_disconnect();
                    self.finish(worker)?;
                    return Ok(None);
                }
            }
        }
    }

    fn finish(&mut self, worker: Worker) -> io::Result<()> {
        if worker.handle.join().is_err() {
            warn!("Worker thread panicked");
        }
        // Hook scripts write straight to the terminal; repaint everything
        self.terminal.clear()
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Open the interface, run it, and restore the terminal
pub fn run(manager: Arc<PackageManager>, theme: Theme) -> io::Result<()> {
    let mut tui = Tui::new(theme)?;
    let result = tui.run(manager);
    tui.restore()?;
    result
}
