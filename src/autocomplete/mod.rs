//! Typeahead controller for the two ticker inputs.
//!
//! The controller is a pure state machine: handlers mutate session state and
//! return [`Command`]s (arm a timer, run a search, submit the form) that the
//! [`runtime`] executes. Per input:
//!
//! ```text
//! Closed ──timer──▶ Searching ──response──▶ Open(results | none | failed)
//!   ▲                                              │
//!   └── escape / blur / outside click / empty text / select
//! ```
//!
//! Typing only re-arms the debounce timer; whatever is displayed stays until
//! the timer fires. Responses are applied in arrival order, whichever request
//! they belong to, so a slow response can overwrite a newer one.

pub mod runtime;

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::AutocompleteConfig;
use crate::error::DashboardError;
use crate::models::SymbolMatch;

// ── Inputs and keys ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TickerInput {
    A,
    B,
}

impl TickerInput {
    pub fn other(&self) -> Self {
        match self {
            TickerInput::A => TickerInput::B,
            TickerInput::B => TickerInput::A,
        }
    }

    fn slot(&self) -> usize {
        match self {
            TickerInput::A => 0,
            TickerInput::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Down,
    Up,
    Enter,
    Escape,
    Other,
}

/// Identifies one armed debounce timer; a fired timer whose token is no
/// longer pending was cancelled.
pub type TimerToken = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ArmTimer { input: TickerInput, token: TimerToken, delay: Duration },
    CancelTimer { input: TickerInput, token: TimerToken },
    Search { input: TickerInput, query: String },
    /// Close this input's dropdown once the grace delay has passed.
    CloseAfter { input: TickerInput, delay: Duration },
    /// Write-back to the input field.
    SetValue { input: TickerInput, value: String },
    SubmitAnalysis,
}

// ── Session state ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Results(Vec<SymbolMatch>),
    NoResults,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DropdownState {
    #[default]
    Closed,
    Searching,
    Open(Listing),
}

#[derive(Debug, Clone, Default)]
pub struct AutocompleteSession {
    value: String,
    /// Armed debounce timer and the query it will search for.
    pending: Option<(TimerToken, String)>,
    dropdown: DropdownState,
    highlight: Option<usize>,
    last_query: Option<String>,
}

impl AutocompleteSession {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Highlighted row; `None` is "no highlight" (index −1).
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    #[cfg(test)]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.dropdown != DropdownState::Closed
    }

    pub fn results(&self) -> &[SymbolMatch] {
        match &self.dropdown {
            DropdownState::Open(Listing::Results(r)) => r,
            _ => &[],
        }
    }

    fn close(&mut self) {
        self.dropdown = DropdownState::Closed;
        self.highlight = None;
    }
}

// ── Dropdown view model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownRow {
    pub symbol: String,
    pub name: String,
    pub venue: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DropdownView {
    Hidden,
    Placeholder(String),
    Rows(Vec<DropdownRow>),
}

pub const SEARCHING_TEXT: &str = "Searching…";
pub const NO_RESULTS_TEXT: &str = "No results found";
pub const SEARCH_FAILED_TEXT: &str = "Search failed";

// ── Controller ────────────────────────────────────────────────────────────────

pub struct AutocompleteController {
    sessions: [AutocompleteSession; 2],
    /// Input owning the outside-click close behaviour.
    active: Option<TickerInput>,
    next_token: TimerToken,
    timing: AutocompleteConfig,
}

impl AutocompleteController {
    pub fn new(timing: AutocompleteConfig) -> Self {
        Self {
            sessions: [AutocompleteSession::default(), AutocompleteSession::default()],
            active: None,
            next_token: 1,
            timing,
        }
    }

    pub fn session(&self, input: TickerInput) -> &AutocompleteSession {
        &self.sessions[input.slot()]
    }

    fn session_mut(&mut self, input: TickerInput) -> &mut AutocompleteSession {
        &mut self.sessions[input.slot()]
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<TickerInput> {
        self.active
    }

    pub fn dropdown(&self, input: TickerInput) -> DropdownView {
        let session = self.session(input);
        match &session.dropdown {
            DropdownState::Closed => DropdownView::Hidden,
            DropdownState::Searching => DropdownView::Placeholder(SEARCHING_TEXT.to_string()),
            DropdownState::Open(Listing::NoResults) => DropdownView::Placeholder(NO_RESULTS_TEXT.to_string()),
            DropdownState::Open(Listing::Failed) => DropdownView::Placeholder(SEARCH_FAILED_TEXT.to_string()),
            DropdownState::Open(Listing::Results(results)) => DropdownView::Rows(
                results
                    .iter()
                    .enumerate()
                    .map(|(i, m)| DropdownRow {
                        symbol: m.symbol.clone(),
                        name: m.name.clone(),
                        venue: m.venue().to_string(),
                        highlighted: session.highlight == Some(i),
                    })
                    .collect(),
            ),
        }
    }

    fn arm(&mut self, input: TickerInput, query: String, delay: Duration) -> Vec<Command> {
        let mut commands = self.cancel_pending(input);
        let token = self.next_token;
        self.next_token += 1;
        self.session_mut(input).pending = Some((token, query));
        commands.push(Command::ArmTimer { input, token, delay });
        commands
    }

    fn cancel_pending(&mut self, input: TickerInput) -> Vec<Command> {
        match self.session_mut(input).pending.take() {
            Some((token, _)) => vec![Command::CancelTimer { input, token }],
            None => Vec::new(),
        }
    }

    /// Text change: re-arm the debounce, or close on an empty query.
    pub fn on_text(&mut self, input: TickerInput, text: &str) -> Vec<Command> {
        self.session_mut(input).value = text.to_string();
        let query = text.trim().to_string();

        if query.is_empty() {
            let commands = self.cancel_pending(input);
            self.close(input);
            return commands;
        }
        let delay = self.timing.debounce();
        self.arm(input, query, delay)
    }

    /// Focus on a field that already has text re-opens its dropdown quickly.
    pub fn on_focus(&mut self, input: TickerInput) -> Vec<Command> {
        let query = self.session(input).value.trim().to_string();
        if query.is_empty() {
            return Vec::new();
        }
        let delay = self.timing.focus_debounce();
        self.arm(input, query, delay)
    }

    /// Debounce timer elapsed. Stale tokens are ignored.
    pub fn on_timer(&mut self, input: TickerInput, token: TimerToken) -> Vec<Command> {
        let query = match self.session_mut(input).pending.take_if(|(t, _)| *t == token) {
            Some((_, query)) => query,
            None => {
                debug!("Ignoring stale timer {} for {:?}", token, input);
                return Vec::new();
            }
        };

        // this dropdown supersedes the other one
        let other = input.other();
        if self.session(other).is_open() {
            self.session_mut(other).close();
        }
        self.active = Some(input);

        let session = self.session_mut(input);
        session.dropdown = DropdownState::Searching;
        session.highlight = None;
        session.last_query = Some(query.clone());

        vec![Command::Search { input, query }]
    }

    /// A search finished. Applied unconditionally: the last response to
    /// arrive wins, even if it answers an older query.
    pub fn on_search_result(
        &mut self,
        input: TickerInput,
        result: Result<Vec<SymbolMatch>, DashboardError>,
    ) {
        let listing = match result {
            Ok(results) if results.is_empty() => Listing::NoResults,
            Ok(results) => Listing::Results(results),
            Err(_) => Listing::Failed,
        };
        let other = input.other();
        if self.session(other).is_open() {
            self.session_mut(other).close();
        }
        let session = self.session_mut(input);
        session.dropdown = DropdownState::Open(listing);
        session.highlight = None;
        self.active = Some(input);
    }

    pub fn on_key(&mut self, input: TickerInput, key: Key) -> Vec<Command> {
        let count = self.session(input).results().len();
        let navigable = self.session(input).is_open() && count > 0;

        if !navigable {
            return match key {
                Key::Enter => {
                    self.close(input);
                    vec![Command::SubmitAnalysis]
                }
                Key::Escape => {
                    self.close(input);
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        let last = count - 1;
        let session = self.session_mut(input);
        match key {
            Key::Down => {
                session.highlight = Some(session.highlight.map_or(0, |h| (h + 1).min(last)));
                Vec::new()
            }
            Key::Up => {
                session.highlight = Some(session.highlight.map_or(0, |h| h.saturating_sub(1)));
                Vec::new()
            }
            Key::Enter => match session.highlight {
                Some(i) => self.select(input, i),
                None => {
                    self.close(input);
                    vec![Command::SubmitAnalysis]
                }
            },
            Key::Escape => {
                self.close(input);
                Vec::new()
            }
            Key::Other => Vec::new(),
        }
    }

    /// Write the chosen symbol into the input and close. Does not submit.
    pub fn select(&mut self, input: TickerInput, index: usize) -> Vec<Command> {
        let Some(symbol) = self.session(input).results().get(index).map(|m| m.symbol.clone()) else {
            return Vec::new();
        };
        let mut commands = self.cancel_pending(input);
        self.session_mut(input).value = symbol.clone();
        self.close(input);
        commands.push(Command::SetValue { input, value: symbol });
        commands
    }

    pub fn on_blur(&mut self, input: TickerInput) -> Vec<Command> {
        vec![Command::CloseAfter { input, delay: self.timing.blur_grace() }]
    }

    /// Grace delay after blur elapsed.
    pub fn on_blur_elapsed(&mut self, input: TickerInput) {
        if self.session(input).is_open() {
            self.close(input);
        }
    }

    /// Click outside both inputs and dropdowns.
    pub fn on_outside_click(&mut self) {
        if let Some(input) = self.active.take() {
            self.session_mut(input).close();
        }
    }

    /// External write (history replay) without triggering a search.
    pub fn set_value(&mut self, input: TickerInput, value: &str) -> Vec<Command> {
        let commands = self.cancel_pending(input);
        self.session_mut(input).value = value.to_string();
        self.close(input);
        commands
    }

    fn close(&mut self, input: TickerInput) {
        self.session_mut(input).close();
        if self.active == Some(input) {
            self.active = None;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
