//! Tab selection and global hotkey dispatch.

use std::sync::Arc;

use tracing::debug;

use crate::frames::{BrowsingContext, FrameLifecycleManager, Panel, ReloadRequest};
use crate::keys::{Key, KeyEvent, KeyOutcome};
use crate::{Engine, EngineCatalog, HotkeyIndex, LoadState, SessionState, UrlTemplater};

/// Side effects the host must carry out after a controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEffect {
    /// Move focus into the query input.
    FocusInput,
    /// Move focus onto the tab list.
    FocusTabList,
    /// Open a URL outside the session.
    Open { url: String, target: BrowsingContext },
    /// Re-fetch a mounted panel.
    Reload(ReloadRequest),
    /// The query or active engine changed; mirror it into the address.
    AddressChanged { query: String, engine: String },
}

/// Owns tab selection. Drives [`SessionState`] and the
/// [`FrameLifecycleManager`] and queues [`TabEffect`]s for the host.
#[derive(Debug)]
pub struct TabController {
    catalog: Arc<EngineCatalog>,
    hotkeys: HotkeyIndex,
    state: SessionState,
    frames: FrameLifecycleManager,
    effects: Vec<TabEffect>,
}

impl TabController {
    /// Creates a controller with the primary tab active.
    pub fn new(catalog: Arc<EngineCatalog>, query: impl Into<String>, touch_primary: bool) -> Self {
        let hotkeys = HotkeyIndex::from_catalog(&catalog);
        let state = SessionState::new(&catalog, query);
        let frames = FrameLifecycleManager::new(catalog.len(), touch_primary);
        Self {
            catalog,
            hotkeys,
            state,
            frames,
            effects: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &EngineCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn hotkeys(&self) -> &HotkeyIndex {
        &self.hotkeys
    }

    pub fn active_index(&self) -> usize {
        self.state.active_index()
    }

    pub fn active_engine(&self) -> &Engine {
        // active_index is always within the catalog
        &self.catalog.engines()[self.state.active_index()]
    }

    /// Takes the queued effects.
    pub fn drain_effects(&mut self) -> Vec<TabEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Selects tab `index`. Selecting the active tab requests a reload
    /// instead. Out-of-range indices are ignored. Returns true when the
    /// selection changed or a reload was issued.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.state.len() {
            return false;
        }
        if index == self.state.active_index() {
            return self.reload_active();
        }

        self.state.set_active(index);
        self.state.activate();
        if self.catalog.get(index).is_some_and(|e| e.embeddable) {
            self.state.advance(index, LoadState::Loading);
        }
        self.frames.sync(&self.catalog, &mut self.state);
        debug!("Selected tab {} ({})", index, self.active_engine().name);
        self.push_address();
        true
    }

    pub fn select_next(&mut self) -> bool {
        let next = (self.state.active_index() + 1) % self.state.len();
        self.select(next)
    }

    pub fn select_previous(&mut self) -> bool {
        let len = self.state.len();
        let previous = (self.state.active_index() + len - 1) % len;
        self.select(previous)
    }

    /// Selects the next tab, circularly after the active one, whose hotkey
    /// starts with `c`. When the active tab is the only match it is reloaded.
    pub fn select_by_hotkey(&mut self, c: char) -> bool {
        match self.hotkeys.next_match(c, self.state.active_index()) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    /// Reloads the active tab if it is Ready and mounted.
    pub fn reload_active(&mut self) -> bool {
        let index = self.state.active_index();
        match self.frames.reload(&self.catalog, &self.state, index) {
            Some(request) => {
                self.effects.push(TabEffect::Reload(request));
                true
            }
            None => false,
        }
    }

    /// Commits a new query. Returns false if it was unchanged.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        if !self.state.set_query(query) {
            return false;
        }
        self.frames.sync(&self.catalog, &mut self.state);
        self.push_address();
        true
    }

    /// Handles the content-loaded signal of a panel.
    pub fn on_content_loaded(&mut self, index: usize) -> bool {
        self.frames.on_content_loaded(&mut self.state, index)
    }

    pub fn panel(&self, index: usize) -> Option<Panel> {
        self.frames.panel(&self.catalog, &self.state, index)
    }

    pub fn panels(&self) -> Vec<Panel> {
        self.frames.panels(&self.catalog, &self.state)
    }

    /// Dispatches a key pressed while focus is outside the query input.
    pub fn handle_key(&mut self, event: KeyEvent) -> KeyOutcome {
        let mods = event.modifiers;
        let handled = match event.key {
            Key::Char('/') | Key::Char('\\') => {
                self.effects.push(TabEffect::FocusInput);
                true
            }
            Key::ArrowLeft | Key::ArrowUp if !mods.command() => self.select_previous(),
            Key::ArrowRight | Key::ArrowDown if !mods.command() => self.select_next(),
            Key::Tab if mods.ctrl => false,
            Key::Tab if mods.shift => self.select_previous(),
            Key::Tab => self.select_next(),
            Key::Enter if mods.any() => self.open_active(BrowsingContext::New),
            Key::Enter => self.reload_active(),
            Key::Char(c) if !mods.command() => self.handle_char(c),
            _ => false,
        };

        if handled {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }

    fn handle_char(&mut self, c: char) -> bool {
        if self.hotkeys.contains(c) {
            return self.select_by_hotkey(c);
        }
        match c.to_digit(10) {
            Some(d) if d >= 1 => self.select(d as usize - 1),
            _ => false,
        }
    }

    fn open_active(&mut self, target: BrowsingContext) -> bool {
        let query = self.state.query();
        if query.is_empty() {
            return false;
        }
        let url = UrlTemplater::resolve(self.active_engine(), query);
        self.effects.push(TabEffect::Open { url, target });
        true
    }

    fn push_address(&mut self) {
        self.effects.push(TabEffect::AddressChanged {
            query: self.state.query().to_string(),
            engine: self.active_engine().name.clone(),
        });
    }
}
