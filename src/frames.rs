//! Mount and load lifecycle of the per-engine panels.

use serde::Serialize;
use tracing::debug;

use crate::{EngineCatalog, LoadState, SessionState, UrlTemplater};

/// Where an external URL should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowsingContext {
    /// A new tab or window.
    New,
    /// Replace the current page.
    Current,
}

/// An action offered by a non-embeddable engine's card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExternalAction {
    Open { url: String, target: BrowsingContext },
    NativeScheme { url: String },
}

/// Embedded result page for an embeddable engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedPanel {
    pub index: usize,
    /// Resolved URL while mounted, `None` otherwise.
    pub src: Option<String>,
    pub load_state: LoadState,
    /// Bumped on every manual reload so the host re-issues the fetch.
    pub generation: u64,
}

/// "Use externally" card for an engine that cannot be embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalLinkCard {
    pub index: usize,
    /// Empty while the query is empty.
    pub actions: Vec<ExternalAction>,
}

/// What a tab renders in its content area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Panel {
    Embedded(EmbeddedPanel),
    External(ExternalLinkCard),
}

/// Request to re-fetch a mounted panel's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    pub index: usize,
    pub url: String,
    pub generation: u64,
}

/// Decides per tab whether content is mounted and tracks its load progress.
///
/// Load state itself lives in [`SessionState`]; the manager only owns the
/// reload generations and the client capabilities that shape panels.
#[derive(Debug, Clone)]
pub struct FrameLifecycleManager {
    generations: Box<[u64]>,
    touch_primary: bool,
}

impl FrameLifecycleManager {
    pub fn new(tabs: usize, touch_primary: bool) -> Self {
        Self {
            generations: vec![0; tabs].into_boxed_slice(),
            touch_primary,
        }
    }

    /// Mount policy.
    ///
    /// Tab 0 mounts whenever the query is non-empty. Other embeddable tabs
    /// additionally need the activation flag and must be active or preload.
    pub fn should_mount(catalog: &EngineCatalog, state: &SessionState, index: usize) -> bool {
        let Some(engine) = catalog.get(index) else {
            return false;
        };
        if !engine.embeddable || state.query().is_empty() {
            return false;
        }
        if index == 0 {
            return true;
        }
        state.is_activated() && (index == state.active_index() || engine.preload)
    }

    /// Moves every tab that now mounts from Init to Loading. Returns the
    /// indices that were newly mounted.
    pub fn sync(&self, catalog: &EngineCatalog, state: &mut SessionState) -> Vec<usize> {
        let mut mounted = Vec::new();
        for index in 0..state.len() {
            if state.load_state(index) == Some(LoadState::Init)
                && Self::should_mount(catalog, state, index)
                && state.advance(index, LoadState::Loading)
            {
                debug!("Mounted tab {}", index);
                mounted.push(index);
            }
        }
        mounted
    }

    /// Handles the content-loaded signal for a tab. Only a Loading tab moves
    /// to Ready.
    pub fn on_content_loaded(&self, state: &mut SessionState, index: usize) -> bool {
        if state.load_state(index) != Some(LoadState::Loading) {
            return false;
        }
        debug!("Tab {} ready", index);
        state.advance(index, LoadState::Ready)
    }

    /// Re-issues the content fetch of a Ready, mounted tab. Any other state
    /// is a no-op so a tab is never mounted twice.
    pub fn reload(
        &mut self,
        catalog: &EngineCatalog,
        state: &SessionState,
        index: usize,
    ) -> Option<ReloadRequest> {
        if state.load_state(index) != Some(LoadState::Ready)
            || !Self::should_mount(catalog, state, index)
        {
            return None;
        }
        let engine = catalog.get(index)?;
        let generation = self.generations.get_mut(index)?;
        *generation += 1;
        debug!("Reloading tab {} ({}), generation {}", index, engine.name, generation);

        Some(ReloadRequest {
            index,
            url: UrlTemplater::resolve(engine, state.query()),
            generation: *generation,
        })
    }

    /// Builds the panel for one tab.
    pub fn panel(&self, catalog: &EngineCatalog, state: &SessionState, index: usize) -> Option<Panel> {
        let engine = catalog.get(index)?;
        let query = state.query();

        if engine.embeddable {
            let src = Self::should_mount(catalog, state, index)
                .then(|| UrlTemplater::resolve(engine, query));
            return Some(Panel::Embedded(EmbeddedPanel {
                index,
                src,
                load_state: state.load_state(index)?,
                generation: self.generations.get(index).copied().unwrap_or_default(),
            }));
        }

        let mut actions = Vec::new();
        if !query.is_empty() {
            let url = UrlTemplater::resolve(engine, query);
            actions.push(ExternalAction::Open {
                url: url.clone(),
                target: BrowsingContext::New,
            });
            actions.push(ExternalAction::Open {
                url,
                target: BrowsingContext::Current,
            });
            if self.touch_primary {
                if let Some(url) = UrlTemplater::resolve_scheme(engine, query) {
                    actions.push(ExternalAction::NativeScheme { url });
                }
            }
        }
        Some(Panel::External(ExternalLinkCard { index, actions }))
    }

    /// Builds every panel in tab order.
    pub fn panels(&self, catalog: &EngineCatalog, state: &SessionState) -> Vec<Panel> {
        (0..catalog.len())
            .filter_map(|i| self.panel(catalog, state, i))
            .collect()
    }
}
