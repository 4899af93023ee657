//! Search session: wires the tab and autocomplete controllers to the host.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::address::{mirror_address, query_from_address, AddressMirror};
use crate::autocomplete::{AutoCompleteController, AutoCompleteEffect, AutoCompleteEvent};
use crate::config::{ClientEnvironment, SessionConfig};
use crate::frames::{BrowsingContext, Panel, ReloadRequest};
use crate::keys::{Key, KeyEvent, KeyOutcome};
use crate::suggest::{HttpSuggestionSource, SuggestionSource};
use crate::tabs::{TabController, TabEffect};
use crate::{EngineCatalog, Focus, Result};

/// Handle to the global key listener.
///
/// The host forwards document key presses through [`send`](Self::send).
/// The listener is bound to the session: dropping the handle detaches it,
/// and [`SearchSession::teardown`] detaches it even if the host still holds
/// the handle.
#[derive(Debug)]
pub struct KeyboardSubscription {
    tx: UnboundedSender<KeyEvent>,
}

impl KeyboardSubscription {
    /// Forwards a key press. Returns false once the session is gone.
    pub fn send(&self, event: KeyEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the session is still listening.
    pub fn is_attached(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl Drop for KeyboardSubscription {
    fn drop(&mut self) {
        debug!("Keyboard listener released");
    }
}

/// Work the host must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    FocusInput,
    FocusTabList,
    BlurInput,
    SetInputValue(String),
    Open { url: String, target: BrowsingContext },
    Reload(ReloadRequest),
}

/// Something the session should react to.
#[derive(Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    AutoComplete(AutoCompleteEvent),
    /// The host dropped the keyboard subscription.
    KeyboardReleased,
}

/// Builder for [`SearchSession`].
pub struct SessionBuilder {
    catalog: Arc<EngineCatalog>,
    config: SessionConfig,
    environment: ClientEnvironment,
    source: Option<Arc<dyn SuggestionSource>>,
    address: Option<String>,
    mirror: Option<Box<dyn AddressMirror>>,
}

impl SessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn environment(mut self, environment: ClientEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Overrides the suggestion source built from the config endpoint.
    pub fn suggestions(mut self, source: Arc<dyn SuggestionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Current visible address, used to seed the query and as the base for
    /// mirroring.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn mirror(mut self, mirror: impl AddressMirror + 'static) -> Self {
        self.mirror = Some(Box::new(mirror));
        self
    }

    /// Starts the session. The keyboard subscription is `None` on
    /// touch-primary clients.
    pub fn start(self) -> Result<(SearchSession, Option<KeyboardSubscription>)> {
        let query = match &self.address {
            Some(address) => query_from_address(address, &self.config.query_param)?,
            None => None,
        }
        .unwrap_or_default();

        let source: Arc<dyn SuggestionSource> = match self.source {
            Some(source) => source,
            None => Arc::new(HttpSuggestionSource::new(
                self.config.suggest_endpoint.clone(),
                self.config.suggest_timeout(),
            )?),
        };

        let query = query.trim().to_string();
        let tabs = TabController::new(self.catalog, query.clone(), self.environment.touch_primary);
        let autocomplete =
            AutoCompleteController::new(source, self.config.debounce(), self.config.ordering)
                .with_value(query.clone());

        let (keys, subscription) = if self.environment.touch_primary {
            (None, None)
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            (Some(rx), Some(KeyboardSubscription { tx }))
        };
        let mut effects = Vec::new();
        if query.is_empty() {
            effects.push(SessionEffect::FocusInput);
        }
        debug!(
            "Session started with {} engines, keyboard {}",
            tabs.catalog().len(),
            if keys.is_some() { "attached" } else { "not attached" }
        );

        let session = SearchSession {
            tabs,
            autocomplete,
            config: self.config,
            focus: Focus::default(),
            address: self.address,
            mirror: self.mirror,
            keys,
            effects,
        };
        Ok((session, subscription))
    }
}

/// One multi-engine search session.
///
/// The host drives it from a single task:
///
/// ```rust,no_run
/// # async fn drive(mut session: a3s_search_session::SearchSession) {
/// loop {
///     let event = session.next_event().await;
///     session.dispatch(event);
///     for effect in session.drain_effects() {
///         // apply to the page
///         # let _ = effect;
///     }
/// }
/// # }
/// ```
pub struct SearchSession {
    tabs: TabController,
    autocomplete: AutoCompleteController,
    config: SessionConfig,
    focus: Focus,
    address: Option<String>,
    mirror: Option<Box<dyn AddressMirror>>,
    keys: Option<UnboundedReceiver<KeyEvent>>,
    effects: Vec<SessionEffect>,
}

impl SearchSession {
    pub fn builder(catalog: Arc<EngineCatalog>) -> SessionBuilder {
        SessionBuilder {
            catalog,
            config: SessionConfig::default(),
            environment: ClientEnvironment::default(),
            source: None,
            address: None,
            mirror: None,
        }
    }

    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }

    pub fn autocomplete(&self) -> &AutoCompleteController {
        &self.autocomplete
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn query(&self) -> &str {
        self.tabs.state().query()
    }

    /// Last mirrored address.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn panels(&self) -> Vec<Panel> {
        self.tabs.panels()
    }

    pub fn keyboard_attached(&self) -> bool {
        self.keys.is_some()
    }

    pub fn drain_effects(&mut self) -> Vec<SessionEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Waits for the next key press or autocomplete completion.
    pub async fn next_event(&mut self) -> SessionEvent {
        let keys = &mut self.keys;
        let autocomplete = &mut self.autocomplete;
        tokio::select! {
            key = recv_key(keys) => match key {
                Some(event) => SessionEvent::Key(event),
                None => SessionEvent::KeyboardReleased,
            },
            event = autocomplete.next_event() => SessionEvent::AutoComplete(event),
        }
    }

    pub fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Key(key) => {
                self.on_key(key);
            }
            SessionEvent::AutoComplete(event) => {
                self.autocomplete.handle_event(event);
                self.flush();
            }
            SessionEvent::KeyboardReleased => {
                debug!("Keyboard subscription dropped by host");
                self.keys = None;
            }
        }
    }

    /// Routes a key press by focus. Inside the query input only the
    /// autocomplete sees keys; Escape also hands focus to the tab list.
    pub fn on_key(&mut self, event: KeyEvent) -> KeyOutcome {
        let outcome = if self.focus == Focus::QueryInput {
            let outcome = self.autocomplete.handle_key(event);
            if event.key == Key::Escape {
                self.effects.push(SessionEffect::FocusTabList);
            }
            outcome
        } else {
            self.tabs.handle_key(event)
        };
        self.flush();
        outcome
    }

    pub fn on_input_change(&mut self, value: impl Into<String>) {
        self.autocomplete.on_input_change(value);
        self.flush();
    }

    pub fn on_input_focus(&mut self) {
        self.focus = Focus::QueryInput;
        let value = self.autocomplete.value().to_string();
        self.autocomplete.on_focus(&value);
        self.flush();
    }

    pub fn on_input_blur(&mut self) {
        if self.focus == Focus::QueryInput {
            self.focus = Focus::Elsewhere;
        }
        self.autocomplete.on_blur();
        self.flush();
    }

    pub fn on_tab_list_focus(&mut self) {
        self.focus = Focus::TabList;
    }

    /// Focus moved into the suggestion panel.
    pub fn on_suggestion_panel_focus(&mut self) {
        self.autocomplete.on_panel_focus();
    }

    /// Pointer selection of a suggestion.
    pub fn on_suggestion_click(&mut self, value: impl Into<String>) {
        self.autocomplete.on_select(value);
        self.flush();
    }

    /// The clear button.
    pub fn on_clear(&mut self) {
        self.autocomplete.on_clear();
        self.flush();
    }

    /// The search button reloads the active tab.
    pub fn on_search_button(&mut self) {
        self.tabs.reload_active();
        self.flush();
    }

    /// Pointer press on a tab.
    pub fn on_tab_press(&mut self, index: usize) {
        self.tabs.select(index);
        self.flush();
    }

    pub fn on_content_loaded(&mut self, index: usize) {
        self.tabs.on_content_loaded(index);
    }

    /// Ends the session, releasing the keyboard listener and any pending
    /// debounce timer. A retained [`KeyboardSubscription`] is detached.
    pub fn teardown(mut self) {
        if let Some(mut keys) = self.keys.take() {
            keys.close();
            debug!("Keyboard listener released");
        }
        debug!("Session torn down");
    }

    fn flush(&mut self) {
        loop {
            let completions = self.autocomplete.drain_effects();
            let tab_effects = self.tabs.drain_effects();
            if completions.is_empty() && tab_effects.is_empty() {
                break;
            }
            for effect in completions {
                match effect {
                    AutoCompleteEffect::SetValue(value) => {
                        self.effects.push(SessionEffect::SetInputValue(value));
                    }
                    AutoCompleteEffect::Submit(query) => self.submit(&query),
                    AutoCompleteEffect::Blur => self.effects.push(SessionEffect::BlurInput),
                }
            }
            for effect in tab_effects {
                match effect {
                    TabEffect::FocusInput => self.effects.push(SessionEffect::FocusInput),
                    TabEffect::FocusTabList => self.effects.push(SessionEffect::FocusTabList),
                    TabEffect::Open { url, target } => {
                        self.effects.push(SessionEffect::Open { url, target });
                    }
                    TabEffect::Reload(request) => self.effects.push(SessionEffect::Reload(request)),
                    TabEffect::AddressChanged { query, engine } => self.push_address(&query, &engine),
                }
            }
        }
    }

    /// Commits a query with surrounding whitespace removed. A non-empty
    /// query also blurs the input.
    fn submit(&mut self, query: &str) {
        let query = query.trim();
        if !query.is_empty() {
            self.effects.push(SessionEffect::BlurInput);
        }
        self.tabs.set_query(query);
    }

    fn push_address(&mut self, query: &str, engine: &str) {
        let Some(current) = self.address.as_deref() else {
            return;
        };
        match mirror_address(
            current,
            &self.config.query_param,
            query,
            &self.config.engine_param,
            engine,
        ) {
            Ok(address) => {
                if let Some(mirror) = self.mirror.as_mut() {
                    mirror.replace(&address);
                }
                self.address = Some(address);
            }
            Err(e) => warn!("Failed to mirror address: {}", e),
        }
    }
}

async fn recv_key(keys: &mut Option<UnboundedReceiver<KeyEvent>>) -> Option<KeyEvent> {
    match keys {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::Suggestions;
    use crate::{Engine, LoadState};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticSource;

    #[async_trait]
    impl SuggestionSource for StaticSource {
        async fn suggest(&self, query: &str) -> Result<Suggestions> {
            Ok(Suggestions::new(None, vec![format!("{query}!")]))
        }
    }

    fn catalog() -> Arc<EngineCatalog> {
        Arc::new(
            EngineCatalog::from_engines(vec![
                Engine::new("A", "https://a.com/?q=%s", "a").with_weight(2.0),
                Engine::new("B", "https://b.com/?q=%s", "b"),
            ])
            .unwrap(),
        )
    }

    fn start(env: ClientEnvironment) -> (SearchSession, Option<KeyboardSubscription>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (session, sub) = SearchSession::builder(catalog())
            .environment(env)
            .suggestions(Arc::new(StaticSource))
            .address("https://s.example/search?q=rust")
            .mirror(move |address: &str| sink.lock().unwrap().push(address.to_string()))
            .start()
            .unwrap();
        (session, sub, seen)
    }

    #[tokio::test]
    async fn test_start_seeds_query_from_address() {
        let (mut session, sub, _) = start(ClientEnvironment::desktop());
        assert_eq!(session.query(), "rust");
        assert_eq!(session.autocomplete().value(), "rust");
        assert!(session.drain_effects().is_empty());
        assert!(sub.is_some());
        assert!(session.keyboard_attached());
        assert_eq!(session.tabs().state().load_state(0), Some(LoadState::Loading));
    }

    #[tokio::test]
    async fn test_touch_client_gets_no_subscription() {
        let (session, sub, _) = start(ClientEnvironment::touch());
        assert!(sub.is_none());
        assert!(!session.keyboard_attached());
    }

    #[tokio::test]
    async fn test_subscription_keys_reach_tabs() {
        let (mut session, sub, seen) = start(ClientEnvironment::desktop());
        let sub = sub.unwrap();
        assert!(sub.send(KeyEvent::char('b')));

        let event = session.next_event().await;
        assert!(matches!(event, SessionEvent::Key(_)));
        session.dispatch(event);

        assert_eq!(session.tabs().active_index(), 1);
        assert_eq!(
            seen.lock().unwrap().last().map(String::as_str),
            Some("https://s.example/search?q=rust&engine=B")
        );
        session.teardown();
        assert!(!sub.is_attached());
        assert!(!sub.send(KeyEvent::char('a')));
    }

    #[tokio::test]
    async fn test_dropped_subscription_detaches() {
        let (mut session, sub, _) = start(ClientEnvironment::desktop());
        drop(sub);
        let event = session.next_event().await;
        assert!(matches!(event, SessionEvent::KeyboardReleased));
        session.dispatch(event);
        assert!(!session.keyboard_attached());
    }

    #[tokio::test]
    async fn test_escape_in_input_moves_focus_to_tabs() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_input_focus();
        session.drain_effects();
        assert!(session.on_key(KeyEvent::new(Key::Escape)).is_handled());
        assert_eq!(
            session.drain_effects(),
            vec![SessionEffect::FocusTabList, SessionEffect::BlurInput]
        );
    }

    #[tokio::test]
    async fn test_hotkeys_pass_through_while_typing() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_input_focus();
        assert_eq!(session.on_key(KeyEvent::char('b')), KeyOutcome::Ignored);
        assert_eq!(session.tabs().active_index(), 0);
    }

    #[tokio::test]
    async fn test_slash_requests_input_focus() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_key(KeyEvent::char('/'));
        assert_eq!(session.drain_effects(), vec![SessionEffect::FocusInput]);
    }

    #[tokio::test]
    async fn test_suggestion_click_commits_query() {
        let (mut session, _sub, seen) = start(ClientEnvironment::desktop());
        session.on_suggestion_click("rust book");
        assert_eq!(session.query(), "rust book");
        assert_eq!(
            session.drain_effects(),
            vec![
                SessionEffect::SetInputValue("rust book".into()),
                SessionEffect::BlurInput,
            ]
        );
        assert_eq!(
            seen.lock().unwrap().last().map(String::as_str),
            Some("https://s.example/search?q=rust+book&engine=A")
        );
    }

    #[tokio::test]
    async fn test_submit_trims_query_and_blurs() {
        let (mut session, _sub, seen) = start(ClientEnvironment::desktop());
        session.on_input_focus();
        session.on_input_change("  rust book  ");
        session.drain_effects();

        session.on_key(KeyEvent::new(Key::Enter));
        assert_eq!(session.query(), "rust book");
        assert_eq!(session.drain_effects(), vec![SessionEffect::BlurInput]);
        assert!(matches!(
            &session.panels()[0],
            Panel::Embedded(p) if p.src.as_deref() == Some("https://a.com/?q=rust%20book")
        ));
        assert_eq!(
            seen.lock().unwrap().last().map(String::as_str),
            Some("https://s.example/search?q=rust+book&engine=A")
        );
    }

    #[tokio::test]
    async fn test_blank_submit_keeps_input_focused() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_input_focus();
        session.on_input_change("   ");
        session.drain_effects();

        session.on_key(KeyEvent::new(Key::Enter));
        assert_eq!(session.query(), "");
        assert!(!session.drain_effects().contains(&SessionEffect::BlurInput));
    }

    #[tokio::test]
    async fn test_clear_unmounts_panels() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_clear();
        assert_eq!(session.query(), "");
        assert!(session
            .panels()
            .iter()
            .all(|p| matches!(p, Panel::Embedded(e) if e.src.is_none())));
        assert_eq!(session.address(), Some("https://s.example/search?engine=A"));
    }

    #[tokio::test]
    async fn test_search_button_reloads_ready_tab() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_search_button();
        assert!(session.drain_effects().is_empty());
        session.on_content_loaded(0);
        session.on_search_button();
        assert!(matches!(
            session.drain_effects()[..],
            [SessionEffect::Reload(ReloadRequest { index: 0, .. })]
        ));
    }

    #[tokio::test]
    async fn test_tab_press_on_active_reloads() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_content_loaded(0);
        session.on_tab_press(0);
        assert_eq!(session.tabs().active_index(), 0);
        assert!(matches!(session.drain_effects()[..], [SessionEffect::Reload(_)]));
    }

    #[tokio::test]
    async fn test_autocomplete_events_flow_through_session() {
        let (mut session, _sub, _) = start(ClientEnvironment::desktop());
        session.on_input_focus();
        let event = session.next_event().await;
        session.dispatch(event);
        assert_eq!(session.autocomplete().options(), &["rust!"]);
    }

    #[tokio::test]
    async fn test_start_without_address() {
        let (session, _sub) = SearchSession::builder(catalog())
            .suggestions(Arc::new(StaticSource))
            .start()
            .unwrap();
        assert_eq!(session.query(), "");
        assert!(session.address().is_none());
    }

    #[tokio::test]
    async fn test_start_without_query_focuses_input() {
        let (mut session, _sub) = SearchSession::builder(catalog())
            .suggestions(Arc::new(StaticSource))
            .address("https://s.example/search")
            .start()
            .unwrap();
        assert_eq!(session.drain_effects(), vec![SessionEffect::FocusInput]);
    }

    #[tokio::test]
    async fn test_start_with_invalid_address() {
        let result = SearchSession::builder(catalog())
            .suggestions(Arc::new(StaticSource))
            .address("not a url")
            .start();
        assert!(result.is_err());
    }
}
