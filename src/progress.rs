// src/progress.rs

//! Progress reporting between lifecycle operations and the presentation layer
//!
//! An operation reports an ordered series of [`Stage`] markers followed by
//! exactly one terminal event, either [`ProgressEvent::Done`] or
//! [`ProgressEvent::Failed`]. Implementations of [`ProgressSink`] decide where
//! the events go:
//! - `ChannelSink`: bounded channel to an interactive event loop
//! - `ConsoleSink`: styled status lines on stdout
//! - `SilentSink`: nowhere

use crate::error::Result;
use crate::hooks::HookKind;
use crate::lifecycle::Outcome;
use crate::theme::Theme;
use std::fmt;
use std::sync::mpsc::{self, Receiver, SyncSender};
use tracing::debug;

/// Default capacity of the worker-to-UI channel
pub const CHANNEL_CAPACITY: usize = 32;

/// Named step of a lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingManifest,
    Cloning,
    CheckingUpdates,
    Pulling,
    RunningHook(HookKind),
    Removing,
}

impl Stage {
    /// Human-readable description
    pub fn description(&self) -> String {
        match self {
            Stage::FetchingManifest => "Fetching repository list".to_string(),
            Stage::Cloning => "Cloning repository".to_string(),
            Stage::CheckingUpdates => "Checking for updates".to_string(),
            Stage::Pulling => "Pulling upstream changes".to_string(),
            Stage::RunningHook(kind) => format!("Running {}", kind),
            Stage::Removing => "Removing package directory".to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchingManifest => "fetching-manifest",
            Stage::Cloning => "cloning",
            Stage::CheckingUpdates => "checking-updates",
            Stage::Pulling => "pulling",
            Stage::RunningHook(_) => "running-hook",
            Stage::Removing => "removing",
        };
        f.write_str(name)
    }
}

/// Event delivered to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A stage started for `package` (`*` for batch-wide stages)
    Stage { package: String, stage: Stage },
    /// Non-fatal problem worth showing to the user
    Warning { package: String, message: String },
    /// Terminal: operation succeeded
    Done(Outcome),
    /// Terminal: operation failed
    Failed(String),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Done(_) | ProgressEvent::Failed(_))
    }
}

/// Receiver of lifecycle progress
pub trait ProgressSink {
    fn stage(&mut self, package: &str, stage: Stage);

    fn warn(&mut self, package: &str, message: &str);

    /// Report the terminal result; later calls are ignored
    fn finish(&mut self, result: &Result<Outcome>);
}

/// Discards all progress
#[derive(Debug, Default)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn stage(&mut self, _package: &str, _stage: Stage) {}

    fn warn(&mut self, _package: &str, _message: &str) {}

    fn finish(&mut self, _result: &Result<Outcome>) {}
}

/// Sends progress over a bounded channel
///
/// The sender is dropped right after the terminal event, so the receiving
/// side sees the channel disconnect once the operation is over.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Option<SyncSender<ProgressEvent>>,
}

/// Create a connected sink and receiver
pub fn channel(capacity: usize) -> (ChannelSink, Receiver<ProgressEvent>) {
    let (sender, receiver) = mpsc::sync_channel(capacity);
    (
        ChannelSink {
            sender: Some(sender),
        },
        receiver,
    )
}

impl ChannelSink {
    fn send(&mut self, event: ProgressEvent) {
        let Some(sender) = &self.sender else {
            debug!("Dropping progress event after close: {:?}", event);
            return;
        };
        if sender.send(event).is_err() {
            debug!("Progress receiver is gone, closing channel");
            self.sender = None;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }
}

impl ProgressSink for ChannelSink {
    fn stage(&mut self, package: &str, stage: Stage) {
        self.send(ProgressEvent::Stage {
            package: package.to_string(),
            stage,
        });
    }

    fn warn(&mut self, package: &str, message: &str) {
        self.send(ProgressEvent::Warning {
            package: package.to_string(),
            message: message.to_string(),
        });
    }

    fn finish(&mut self, result: &Result<Outcome>) {
        let event = match result {
            Ok(outcome) => ProgressEvent::Done(outcome.clone()),
            Err(e) => ProgressEvent::Failed(e.to_string()),
        };
        self.send(event);
        self.sender = None;
    }
}

/// Prints stages and warnings as styled lines
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    theme: Theme,
}

impl ConsoleSink {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl ProgressSink for ConsoleSink {
    fn stage(&mut self, package: &str, stage: Stage) {
        println!("{}", self.theme.stage_line(package, &stage));
    }

    fn warn(&mut self, package: &str, message: &str) {
        eprintln!("{}", self.theme.warning_line(package, message));
    }

    fn finish(&mut self, _result: &Result<Outcome>) {
        // The command prints its own summary from the returned result
    }
}
