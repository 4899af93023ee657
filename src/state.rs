//! Per-session tab state.

use serde::{Deserialize, Serialize};

use crate::EngineCatalog;

/// Load progress of one tab's embedded content. Ordered, and only ever
/// moves forward within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Init,
    Loading,
    Ready,
}

/// Mutable state of one search session.
#[derive(Debug, Clone)]
pub struct SessionState {
    active_index: usize,
    query: String,
    load_states: Box<[LoadState]>,
    activated: bool,
}

impl SessionState {
    /// Creates the initial state for a catalog.
    ///
    /// Tab 0 starts Loading when embeddable and Ready otherwise; other tabs
    /// start Init unless they are embeddable preload tabs.
    pub fn new(catalog: &EngineCatalog, query: impl Into<String>) -> Self {
        let load_states = catalog
            .engines()
            .iter()
            .enumerate()
            .map(|(i, engine)| match (i, engine.embeddable) {
                (0, true) => LoadState::Loading,
                (0, false) => LoadState::Ready,
                (_, true) if engine.preload => LoadState::Loading,
                _ => LoadState::Init,
            })
            .collect();

        Self {
            active_index: 0,
            query: query.into(),
            load_states,
            activated: false,
        }
    }

    /// Number of tabs.
    pub fn len(&self) -> usize {
        self.load_states.len()
    }

    /// Always false; a session has at least one tab.
    pub fn is_empty(&self) -> bool {
        self.load_states.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the query. Returns false if it was unchanged.
    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        let query = query.into();
        if query == self.query {
            return false;
        }
        self.query = query;
        true
    }

    /// Sets the active tab. Out-of-range indices are rejected.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.active_index = index;
        true
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Marks the first tab interaction.
    pub fn activate(&mut self) {
        self.activated = true;
    }

    /// Load state of tab `index`, `None` when out of range.
    pub fn load_state(&self, index: usize) -> Option<LoadState> {
        self.load_states.get(index).copied()
    }

    pub fn load_states(&self) -> &[LoadState] {
        &self.load_states
    }

    /// Moves tab `index` forward to `to`. Never regresses; returns true only
    /// if the state changed.
    pub fn advance(&mut self, index: usize, to: LoadState) -> bool {
        match self.load_states.get_mut(index) {
            Some(state) if *state < to => {
                *state = to;
                true
            }
            _ => false,
        }
    }
}
