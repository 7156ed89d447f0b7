use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::autocomplete::{AutocompleteController, Command, Key, TickerInput, TimerToken};
use crate::client::AnalysisService;
use crate::config::AutocompleteConfig;
use crate::error::DashboardError;
use crate::models::SymbolMatch;
use crate::view::DashboardView;

/// User-side events on the two ticker inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Text(TickerInput, String),
    Focus(TickerInput),
    Blur(TickerInput),
    Key(TickerInput, Key),
    /// Pointer selection of a dropdown row.
    Pick(TickerInput, usize),
    OutsideClick,
}

/// Completions produced by timers and searches running in the background.
#[derive(Debug)]
pub enum RuntimeEvent {
    TimerFired { input: TickerInput, token: TimerToken },
    SearchResolved { input: TickerInput, result: Result<Vec<SymbolMatch>, DashboardError> },
    BlurElapsed(TickerInput),
}

/// Drives [`AutocompleteController`] on the tokio runtime: timers are sleeping
/// tasks aborted on cancel, searches are spawned and report back through a
/// channel. In-flight searches are never aborted.
pub struct AutocompleteRuntime<S: AnalysisService + 'static> {
    controller: AutocompleteController,
    service: Arc<S>,
    tx: mpsc::UnboundedSender<RuntimeEvent>,
    rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    timers: HashMap<(TickerInput, TimerToken), JoinHandle<()>>,
    /// Spawned searches and blur-close delays that have not reported back.
    in_flight: usize,
}

impl<S: AnalysisService + 'static> AutocompleteRuntime<S> {
    pub fn new(service: Arc<S>, timing: AutocompleteConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller: AutocompleteController::new(timing),
            service,
            tx,
            rx,
            timers: HashMap::new(),
            in_flight: 0,
        }
    }

    /// No debounce timer is armed and nothing spawned is still due to report.
    /// The runtime keeps its own sender, so [`Self::next_event`] would wait
    /// forever once this is true.
    pub fn is_settled(&self) -> bool {
        self.timers.is_empty() && self.in_flight == 0
    }

    /// Current text of both inputs.
    pub fn values(&self) -> (String, String) {
        (
            self.controller.session(TickerInput::A).value().to_string(),
            self.controller.session(TickerInput::B).value().to_string(),
        )
    }

    /// Apply a user event. Returns `true` when the event asks for an
    /// analysis submission.
    pub fn handle_input<V: DashboardView + ?Sized>(&mut self, event: InputEvent, view: &mut V) -> bool {
        let commands = match event {
            InputEvent::Text(input, text) => self.controller.on_text(input, &text),
            InputEvent::Focus(input) => self.controller.on_focus(input),
            InputEvent::Blur(input) => self.controller.on_blur(input),
            InputEvent::Key(input, key) => self.controller.on_key(input, key),
            InputEvent::Pick(input, index) => self.controller.select(input, index),
            InputEvent::OutsideClick => {
                self.controller.on_outside_click();
                Vec::new()
            }
        };
        self.execute(commands, view)
    }

    /// Write a value into an input without searching (history replay).
    pub fn set_value<V: DashboardView + ?Sized>(&mut self, input: TickerInput, value: &str, view: &mut V) {
        let commands = self.controller.set_value(input, value);
        self.execute(commands, view);
        view.set_input_value(input, value);
    }

    /// Wait for the next background completion.
    pub async fn next_event(&mut self) -> Option<RuntimeEvent> {
        self.rx.recv().await
    }

    pub fn apply<V: DashboardView + ?Sized>(&mut self, event: RuntimeEvent, view: &mut V) -> bool {
        let commands = match event {
            RuntimeEvent::TimerFired { input, token } => {
                self.timers.remove(&(input, token));
                self.controller.on_timer(input, token)
            }
            RuntimeEvent::SearchResolved { input, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.controller.on_search_result(input, result);
                Vec::new()
            }
            RuntimeEvent::BlurElapsed(input) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.controller.on_blur_elapsed(input);
                Vec::new()
            }
        };
        self.execute(commands, view)
    }

    /// Await and apply one background completion.
    #[cfg(test)]
    pub async fn step<V: DashboardView + ?Sized>(&mut self, view: &mut V) -> Option<bool> {
        let event = self.next_event().await?;
        Some(self.apply(event, view))
    }

    fn execute<V: DashboardView + ?Sized>(&mut self, commands: Vec<Command>, view: &mut V) -> bool {
        let mut submit = false;
        for command in commands {
            match command {
                Command::ArmTimer { input, token, delay } => {
                    let tx = self.tx.clone();
                    let handle = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(RuntimeEvent::TimerFired { input, token });
                    });
                    self.timers.insert((input, token), handle);
                }
                Command::CancelTimer { input, token } => {
                    if let Some(handle) = self.timers.remove(&(input, token)) {
                        handle.abort();
                    }
                }
                Command::Search { input, query } => {
                    debug!("Searching '{}' for input {:?}", query, input);
                    let tx = self.tx.clone();
                    let service = Arc::clone(&self.service);
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        let result = service.search(&query).await;
                        if let Err(e) = &result {
                            warn!("Symbol search '{}' failed: {}", query, e);
                        }
                        let _ = tx.send(RuntimeEvent::SearchResolved { input, result });
                    });
                }
                Command::CloseAfter { input, delay } => {
                    let tx = self.tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(RuntimeEvent::BlurElapsed(input));
                    });
                }
                Command::SetValue { input, value } => view.set_input_value(input, &value),
                Command::SubmitAnalysis => submit = true,
            }
        }
        for input in [TickerInput::A, TickerInput::B] {
            view.apply_dropdown(input, &self.controller.dropdown(input));
        }
        submit
    }
}

impl<S: AnalysisService + 'static> Drop for AutocompleteRuntime<S> {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}
