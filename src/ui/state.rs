// src/ui/state.rs

//! Interactive UI state machine
//!
//! [`AppState`] only changes through `handle_key`, `handle_progress`,
//! `handle_disconnect` and `tick`, and never touches the terminal or the
//! package manager. Starting an operation is requested through the returned
//! [`Effect`]; the event loop owns the worker thread.

use crate::lifecycle::{BATCH, Operation, Outcome};
use crate::manifest::ManifestEntry;
use crate::progress::ProgressEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Spinner animation frames
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Install,
    Remove,
    Update,
    Upgrade,
    Find,
    Refresh,
    Help,
    HowToAdd,
    Exit,
}

/// Menu in display order
pub const MENU: &[MenuAction] = &[
    MenuAction::Install,
    MenuAction::Remove,
    MenuAction::Update,
    MenuAction::Upgrade,
    MenuAction::Find,
    MenuAction::Refresh,
    MenuAction::Help,
    MenuAction::HowToAdd,
    MenuAction::Exit,
];

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Install => "install",
            MenuAction::Remove => "remove",
            MenuAction::Update => "update",
            MenuAction::Upgrade => "upgrade",
            MenuAction::Find => "find",
            MenuAction::Refresh => "refresh",
            MenuAction::Help => "help",
            MenuAction::HowToAdd => "how-to-add",
            MenuAction::Exit => "exit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MenuAction::Install => "Install a package",
            MenuAction::Remove => "Remove a package",
            MenuAction::Update => "Update a package",
            MenuAction::Upgrade => "Upgrade all packages",
            MenuAction::Find => "Find packages",
            MenuAction::Refresh => "Refresh package list",
            MenuAction::Help => "Show help",
            MenuAction::HowToAdd => "How to add your own repo",
            MenuAction::Exit => "Exit the application",
        }
    }

    /// Prompt for actions that need a text argument
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            MenuAction::Install | MenuAction::Remove | MenuAction::Update => {
                Some("Enter package name")
            }
            MenuAction::Find => Some("Enter search query"),
            _ => None,
        }
    }

    fn operation(&self, argument: String) -> Option<Operation> {
        match self {
            MenuAction::Install => Some(Operation::Install(argument)),
            MenuAction::Remove => Some(Operation::Remove(argument)),
            MenuAction::Update => Some(Operation::Update(argument)),
            MenuAction::Find => Some(Operation::Find(argument)),
            MenuAction::Upgrade => Some(Operation::Upgrade),
            MenuAction::Refresh => Some(Operation::Refresh),
            _ => None,
        }
    }
}

/// Current screen
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Menu,
    Input {
        action: MenuAction,
    },
    Running {
        operation: String,
        /// Stage and warning lines received so far
        log: Vec<String>,
    },
    Result {
        success: bool,
        message: String,
        details: Vec<String>,
    },
    Found {
        entries: Vec<ManifestEntry>,
        selected: usize,
    },
    Help,
    HowToAdd,
}

/// Side effect requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Start(Operation),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub screen: Screen,
    pub menu_selected: usize,
    pub input: String,
    pub spinner_frame: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Menu,
            menu_selected: 0,
            input: String::new(),
            spinner_frame: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.screen, Screen::Running { .. })
    }

    pub fn spinner(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Advance animations
    pub fn tick(&mut self) {
        if self.is_running() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Effect {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Effect::Quit;
        }

        match &mut self.screen {
            Screen::Menu => self.handle_menu_key(key.code),
            Screen::Input { action } => {
                let action = *action;
                self.handle_input_key(action, key.code)
            }
            Screen::Running { .. } => match key.code {
                // An in-flight external process is not interrupted
                KeyCode::Char('q') => Effect::Quit,
                _ => Effect::None,
            },
            Screen::Found { entries, selected } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *selected = selected.saturating_sub(1);
                    Effect::None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if *selected + 1 < entries.len() {
                        *selected += 1;
                    }
                    Effect::None
                }
                KeyCode::Enter => match entries.get(*selected) {
                    Some(entry) => {
                        let operation = Operation::Install(entry.name.clone());
                        self.start(operation)
                    }
                    None => Effect::None,
                },
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.screen = Screen::Menu;
                    Effect::None
                }
                _ => Effect::None,
            },
            Screen::Result { .. } | Screen::Help | Screen::HowToAdd => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                    self.screen = Screen::Menu;
                    Effect::None
                }
                _ => Effect::None,
            },
        }
    }

    fn handle_menu_key(&mut self, code: KeyCode) -> Effect {
        match code {
            KeyCode::Char('q') => Effect::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_selected = self.menu_selected.saturating_sub(1);
                Effect::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_selected + 1 < MENU.len() {
                    self.menu_selected += 1;
                }
                Effect::None
            }
            KeyCode::Enter => self.select(MENU[self.menu_selected]),
            _ => Effect::None,
        }
    }

    fn select(&mut self, action: MenuAction) -> Effect {
        match action {
            MenuAction::Exit => Effect::Quit,
            MenuAction::Help => {
                self.screen = Screen::Help;
                Effect::None
            }
            MenuAction::HowToAdd => {
                self.screen = Screen::HowToAdd;
                Effect::None
            }
            _ if action.prompt().is_some() => {
                self.input.clear();
                self.screen = Screen::Input { action };
                Effect::None
            }
            _ => match action.operation(String::new()) {
                Some(operation) => self.start(operation),
                None => Effect::None,
            },
        }
    }

    fn handle_input_key(&mut self, action: MenuAction, code: KeyCode) -> Effect {
        match code {
            KeyCode::Esc => {
                self.input.clear();
                self.screen = Screen::Menu;
                Effect::None
            }
            KeyCode::Enter => {
                let value = self.input.trim().to_string();
                if value.is_empty() {
                    return Effect::None;
                }
                self.input.clear();
                match action.operation(value) {
                    Some(operation) => self.start(operation),
                    None => Effect::None,
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                Effect::None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn start(&mut self, operation: Operation) -> Effect {
        self.spinner_frame = 0;
        self.screen = Screen::Running {
            operation: operation.to_string(),
            log: Vec::new(),
        };
        Effect::Start(operation)
    }

    /// Apply a worker event; returns true once the operation has finished
    pub fn handle_progress(&mut self, event: ProgressEvent) -> bool {
        match event {
            ProgressEvent::Stage { package, stage } => {
                self.push_log(if package == BATCH {
                    stage.description()
                } else {
                    format!("{} ({})", stage.description(), package)
                });
                false
            }
            ProgressEvent::Warning { package, message } => {
                self.push_log(format!("warning: {}: {}", package, message));
                false
            }
            ProgressEvent::Done(outcome) => {
                self.screen = outcome_screen(outcome);
                true
            }
            ProgressEvent::Failed(message) => {
                self.screen = Screen::Result {
                    success: false,
                    message,
                    details: Vec::new(),
                };
                true
            }
        }
    }

    /// Worker channel closed without a terminal event
    pub fn handle_disconnect(&mut self) {
        if self.is_running() {
            self.screen = Screen::Result {
                success: false,
                message: "Operation ended without reporting a result".to_string(),
                details: Vec::new(),
            };
        }
    }

    fn push_log(&mut self, line: String) {
        if let Screen::Running { log, .. } = &mut self.screen {
            log.push(line);
        }
    }
}

fn outcome_screen(outcome: Outcome) -> Screen {
    let message = outcome.to_string();
    match outcome {
        Outcome::Found(entries) if !entries.is_empty() => Screen::Found {
            entries,
            selected: 0,
        },
        Outcome::Upgraded(summary) => Screen::Result {
            success: summary.failures.is_empty(),
            message,
            details: summary
                .failures
                .into_iter()
                .map(|(name, error)| format!("{}: {}", name, error))
                .collect(),
        },
        _ => Screen::Result {
            success: true,
            message,
            details: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::UpgradeSummary;
    use crate::progress::Stage;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            assert_eq!(state.handle_key(key(KeyCode::Char(c))), Effect::None);
        }
    }

    #[test]
    fn test_install_flow_requests_operation() {
        let mut state = AppState::new();
        assert_eq!(MENU[0], MenuAction::Install);

        state.handle_key(key(KeyCode::Enter));
        assert_eq!(
            state.screen,
            Screen::Input {
                action: MenuAction::Install
            }
        );

        type_text(&mut state, "hello");
        let effect = state.handle_key(key(KeyCode::Enter));
        assert_eq!(effect, Effect::Start(Operation::Install("hello".to_string())));
        assert!(state.is_running());
        assert!(state.input.is_empty());
    }

    #[test]
    fn test_empty_input_is_ignored() {
        let mut state = AppState::new();
        state.handle_key(key(KeyCode::Enter));
        type_text(&mut state, "  ");
        assert_eq!(state.handle_key(key(KeyCode::Enter)), Effect::None);
        assert!(matches!(state.screen, Screen::Input { .. }));
    }

    #[test]
    fn test_escape_returns_to_menu() {
        let mut state = AppState::new();
        state.handle_key(key(KeyCode::Enter));
        type_text(&mut state, "abc");
        state.handle_key(key(KeyCode::Backspace));
        assert_eq!(state.input, "ab");

        state.handle_key(key(KeyCode::Esc));
        assert_eq!(state.screen, Screen::Menu);
        assert!(state.input.is_empty());
    }

    #[test]
    fn test_upgrade_starts_without_prompt() {
        let mut state = AppState::new();
        for _ in 0..3 {
            state.handle_key(key(KeyCode::Down));
        }
        assert_eq!(MENU[state.menu_selected], MenuAction::Upgrade);
        assert_eq!(
            state.handle_key(key(KeyCode::Enter)),
            Effect::Start(Operation::Upgrade)
        );
    }

    #[test]
    fn test_menu_navigation_is_clamped() {
        let mut state = AppState::new();
        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.menu_selected, 0);
        for _ in 0..20 {
            state.handle_key(key(KeyCode::Down));
        }
        assert_eq!(MENU[state.menu_selected], MenuAction::Exit);
        assert_eq!(state.handle_key(key(KeyCode::Enter)), Effect::Quit);
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let mut state = AppState::new();
        state.handle_key(key(KeyCode::Enter));
        let effect = state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(effect, Effect::Quit);
    }

    #[test]
    fn test_progress_events_drive_running_screen() {
        let mut state = AppState::new();
        state.start(Operation::Install("hello".to_string()));

        assert!(!state.handle_progress(ProgressEvent::Stage {
            package: "hello".to_string(),
            stage: Stage::Cloning,
        }));
        match &state.screen {
            Screen::Running { log, .. } => assert_eq!(log, &["Cloning repository (hello)"]),
            other => panic!("unexpected screen: {other:?}"),
        }

        assert!(state.handle_progress(ProgressEvent::Done(Outcome::Installed {
            name: "hello".to_string(),
        })));
        assert!(matches!(state.screen, Screen::Result { success: true, .. }));
    }

    #[test]
    fn test_failure_shows_error_result() {
        let mut state = AppState::new();
        state.start(Operation::Remove("hello".to_string()));
        state.handle_progress(ProgressEvent::Failed("boom".to_string()));

        assert_eq!(
            state.screen,
            Screen::Result {
                success: false,
                message: "boom".to_string(),
                details: Vec::new(),
            }
        );
        state.handle_key(key(KeyCode::Enter));
        assert_eq!(state.screen, Screen::Menu);
    }

    #[test]
    fn test_found_entries_open_list_and_enter_installs() {
        let mut state = AppState::new();
        state.start(Operation::Find("he".to_string()));
        let entries = vec![
            ManifestEntry {
                name: "hello".to_string(),
                url: "https://example.com/hello.git".to_string(),
            },
            ManifestEntry {
                name: "helix".to_string(),
                url: "https://example.com/helix.git".to_string(),
            },
        ];
        state.handle_progress(ProgressEvent::Done(Outcome::Found(entries)));
        assert!(matches!(state.screen, Screen::Found { selected: 0, .. }));

        state.handle_key(key(KeyCode::Down));
        state.handle_key(key(KeyCode::Down));
        assert_eq!(
            state.handle_key(key(KeyCode::Enter)),
            Effect::Start(Operation::Install("helix".to_string()))
        );
    }

    #[test]
    fn test_empty_find_is_a_result() {
        let mut state = AppState::new();
        state.start(Operation::Find("zzz".to_string()));
        state.handle_progress(ProgressEvent::Done(Outcome::Found(Vec::new())));
        assert!(matches!(
            &state.screen,
            Screen::Result { success: true, message, .. } if message == "No packages found"
        ));
    }

    #[test]
    fn test_upgrade_failures_are_listed() {
        let mut state = AppState::new();
        state.start(Operation::Upgrade);
        let summary = UpgradeSummary {
            attempted: 2,
            updated: 1,
            up_to_date: 0,
            failures: vec![("b".to_string(), "hook failed".to_string())],
        };
        state.handle_progress(ProgressEvent::Done(Outcome::Upgraded(summary)));

        match &state.screen {
            Screen::Result {
                success, details, ..
            } => {
                assert!(!success);
                assert_eq!(details, &["b: hook failed"]);
            }
            other => panic!("unexpected screen: {other:?}"),
        }
    }

    #[test]
    fn test_disconnect_without_result() {
        let mut state = AppState::new();
        state.start(Operation::Refresh);
        state.handle_disconnect();
        assert!(matches!(state.screen, Screen::Result { success: false, .. }));

        // Outside of a running operation a disconnect changes nothing
        state.screen = Screen::Menu;
        state.handle_disconnect();
        assert_eq!(state.screen, Screen::Menu);
    }

    #[test]
    fn test_spinner_only_advances_while_running() {
        let mut state = AppState::new();
        state.tick();
        assert_eq!(state.spinner_frame, 0);

        state.start(Operation::Refresh);
        state.tick();
        assert_eq!(state.spinner(), SPINNER_FRAMES[1]);
    }
}
