//! Debounced autocomplete controller.
//!
//! The controller is owned by a single task. Timers and fetches run as
//! spawned tasks that post [`AutoCompleteEvent`]s back over the controller's
//! own channel; the owner awaits [`AutoCompleteController::next_event`] and
//! feeds each event to [`AutoCompleteController::handle_event`], so every
//! state change happens on the owning task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ResponseOrdering;
use crate::keys::{Key, KeyEvent, KeyOutcome};
use crate::suggest::{SuggestionSource, Suggestions};
use crate::Result;

/// Cached suggestions and the highlighted row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    /// Raw text that produced `options`.
    pub producing_value: Option<String>,
    pub options: Vec<String>,
    /// Highlighted row; `None` means nothing is highlighted.
    pub cursor: Option<usize>,
}

/// Completion of a timer or fetch task.
#[derive(Debug)]
pub enum AutoCompleteEvent {
    /// The quiet period for timer `seq` elapsed.
    DebounceElapsed { seq: u64, value: String },
    /// A suggestion fetch finished.
    Fetched {
        token: u64,
        value: String,
        result: Result<Suggestions>,
    },
    /// Deferred focus check after a blur.
    BlurSettled,
}

/// Side effects for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoCompleteEffect {
    /// Write to the external value binding.
    SetValue(String),
    /// Commit a query to the session.
    Submit(String),
    /// Blur the input.
    Blur,
}

pub struct AutoCompleteController {
    source: Arc<dyn SuggestionSource>,
    debounce: Duration,
    ordering: ResponseOrdering,
    state: SuggestionState,
    /// Current contents of the value binding.
    value: String,
    /// Last text the user typed, restored when the highlight is cleared.
    typed: String,
    open: bool,
    focus_within: bool,
    timer: Option<JoinHandle<()>>,
    timer_seq: u64,
    /// Token of the newest request; clearing the input also bumps it.
    issued: u64,
    in_flight: Option<(u64, String)>,
    events_tx: UnboundedSender<AutoCompleteEvent>,
    events_rx: UnboundedReceiver<AutoCompleteEvent>,
    effects: Vec<AutoCompleteEffect>,
}

impl AutoCompleteController {
    pub fn new(source: Arc<dyn SuggestionSource>, debounce: Duration, ordering: ResponseOrdering) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            source,
            debounce,
            ordering,
            state: SuggestionState::default(),
            value: String::new(),
            typed: String::new(),
            open: false,
            focus_within: false,
            timer: None,
            timer_seq: 0,
            issued: 0,
            in_flight: None,
            events_tx,
            events_rx,
            effects: Vec::new(),
        }
    }

    /// Seeds the bound value without scheduling a refresh.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.typed = self.value.clone();
        self
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn options(&self) -> &[String] {
        &self.state.options
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state.cursor
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.state
            .cursor
            .and_then(|i| self.state.options.get(i))
            .map(String::as_str)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The panel is drawn only while open and non-empty.
    pub fn panel_visible(&self) -> bool {
        self.open && !self.state.options.is_empty()
    }

    /// Whether a debounce timer is pending.
    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn drain_effects(&mut self) -> Vec<AutoCompleteEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Waits for the next timer or fetch completion.
    pub async fn next_event(&mut self) -> AutoCompleteEvent {
        match self.events_rx.recv().await {
            Some(event) => event,
            // The controller holds a sender, so the channel never closes.
            None => std::future::pending().await,
        }
    }

    /// Applies every event that is already queued, without waiting.
    pub fn process_ready(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        processed
    }

    pub fn handle_event(&mut self, event: AutoCompleteEvent) {
        match event {
            AutoCompleteEvent::DebounceElapsed { seq, value } => {
                if seq != self.timer_seq {
                    return;
                }
                self.timer = None;
                debug!("Debounce elapsed for '{}'", value);
                self.refresh_suggestions(&value);
            }
            AutoCompleteEvent::Fetched { token, value, result } => {
                self.apply_response(token, value, result);
            }
            AutoCompleteEvent::BlurSettled => {
                if !self.focus_within {
                    self.open = false;
                    self.state.cursor = None;
                }
            }
        }
    }

    /// The user edited the input.
    pub fn on_input_change(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.state.cursor = None;
        self.value = value.clone();
        self.typed = value.clone();
        self.effects.push(AutoCompleteEffect::SetValue(value.clone()));
        self.schedule(value);
    }

    /// Fetches suggestions for `value` unless they are cached or already
    /// being fetched. An empty value clears the list without a fetch.
    pub fn refresh_suggestions(&mut self, value: &str) {
        if self.state.producing_value.as_deref() == Some(value) {
            return;
        }
        if value.is_empty() {
            self.issued += 1;
            self.in_flight = None;
            self.state.producing_value = None;
            self.state.options.clear();
            self.state.cursor = None;
            return;
        }
        if self.in_flight.as_ref().is_some_and(|(_, v)| v == value) {
            return;
        }

        self.issued += 1;
        let token = self.issued;
        self.in_flight = Some((token, value.to_string()));
        debug!("Fetching suggestions for '{}' (request {})", value, token);

        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        let value = value.to_string();
        tokio::spawn(async move {
            let result = source.suggest(&value).await;
            let _ = tx.send(AutoCompleteEvent::Fetched { token, value, result });
        });
    }

    /// The input gained focus.
    pub fn on_focus(&mut self, value: &str) {
        self.focus_within = true;
        self.refresh_suggestions(value);
        self.open = true;
    }

    /// Focus moved into the suggestion panel.
    pub fn on_panel_focus(&mut self) {
        self.focus_within = true;
    }

    /// The input lost focus. The panel is closed once queued events have
    /// run, so a pointer selection inside the panel lands first.
    pub fn on_blur(&mut self) {
        self.focus_within = false;
        let _ = self.events_tx.send(AutoCompleteEvent::BlurSettled);
    }

    pub fn on_arrow_down(&mut self) {
        let Some(last) = self.state.options.len().checked_sub(1) else {
            return;
        };
        let next = match self.state.cursor {
            None => 0,
            Some(i) => (i + 1).min(last),
        };
        self.move_cursor(Some(next));
    }

    pub fn on_arrow_up(&mut self) {
        let next = match self.state.cursor {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
        self.move_cursor(next);
    }

    pub fn on_enter(&mut self) {
        match self.highlighted().map(str::to_string) {
            Some(option) => self.on_select(option),
            None => self.on_submit(self.value.clone()),
        }
    }

    /// Commits a suggestion.
    pub fn on_select(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.value = value.clone();
        self.typed = value.clone();
        self.effects.push(AutoCompleteEffect::SetValue(value.clone()));
        self.on_submit(value.clone());
        self.refresh_suggestions(&value);
    }

    /// Submits the raw value.
    pub fn on_submit(&mut self, value: impl Into<String>) {
        self.open = false;
        self.state.cursor = None;
        self.effects.push(AutoCompleteEffect::Submit(value.into()));
    }

    pub fn on_escape(&mut self) {
        self.effects.push(AutoCompleteEffect::Blur);
    }

    /// Empties the input and submits the empty query.
    pub fn on_clear(&mut self) {
        self.value.clear();
        self.typed.clear();
        self.effects.push(AutoCompleteEffect::SetValue(String::new()));
        self.on_submit(String::new());
    }

    /// Handles a key pressed inside the input.
    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        match event.key {
            Key::ArrowDown => self.on_arrow_down(),
            Key::ArrowUp => self.on_arrow_up(),
            Key::Enter => self.on_enter(),
            Key::Escape => self.on_escape(),
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Handled
    }

    fn move_cursor(&mut self, cursor: Option<usize>) {
        if cursor == self.state.cursor {
            return;
        }
        self.state.cursor = cursor;
        let preview = match self.highlighted() {
            Some(option) => option.to_string(),
            None => self.typed.clone(),
        };
        self.value = preview.clone();
        self.effects.push(AutoCompleteEffect::SetValue(preview));
    }

    fn schedule(&mut self, value: String) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.timer_seq += 1;
        let seq = self.timer_seq;
        let debounce = self.debounce;
        let tx = self.events_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let _ = tx.send(AutoCompleteEvent::DebounceElapsed { seq, value });
        }));
    }

    fn apply_response(&mut self, token: u64, value: String, result: Result<Suggestions>) {
        if self.in_flight.as_ref().is_some_and(|(t, _)| *t == token) {
            self.in_flight = None;
        }
        if self.ordering == ResponseOrdering::LatestRequest && token != self.issued {
            debug!("Discarding stale suggestions for '{}' (request {})", value, token);
            return;
        }

        match result {
            Ok(suggestions) => {
                self.state.producing_value = Some(value);
                self.state.options = suggestions.options;
                if self.state.cursor.is_some_and(|i| i >= self.state.options.len()) {
                    self.state.cursor = None;
                }
            }
            Err(e) => {
                warn!("Suggestion fetch for '{}' failed: {}", value, e);
            }
        }
    }
}

impl Drop for AutoCompleteController {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
