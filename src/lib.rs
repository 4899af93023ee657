//! # a3s-search-session
//!
//! Controller core for a multi-engine search page: several external search
//! engines shown as tabs over one shared query.
//!
//! This library provides:
//!
//! - An immutable, validated engine catalog with a hotkey index
//! - Tab selection with circular navigation, hotkeys and digit shortcuts
//! - Lazy and preload mounting of embedded engine panels
//! - URL templating for result pages and native deep links
//! - A debounced autocomplete client that discards stale responses
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use a3s_search_session::{Engine, EngineCatalog, KeyEvent, SearchSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = EngineCatalog::from_engines(vec![
//!         Engine::new("Google", "https://www.google.com/search?q=%s", "g").with_weight(2.0),
//!         Engine::new("Wikipedia", "https://en.wikipedia.org/w/index.php?search=%s", "w"),
//!     ])?;
//!
//!     let (mut session, keyboard) = SearchSession::builder(Arc::new(catalog))
//!         .address("https://search.example/?q=rust")
//!         .start()?;
//!
//!     if let Some(keyboard) = &keyboard {
//!         keyboard.send(KeyEvent::char('w'));
//!     }
//!     let event = session.next_event().await;
//!     session.dispatch(event);
//!
//!     for panel in session.panels() {
//!         println!("{:?}", panel);
//!     }
//!     session.teardown();
//!     Ok(())
//! }
//! ```

mod address;
mod autocomplete;
mod catalog;
mod config;
mod engine;
mod error;
mod frames;
mod keys;
mod session;
mod state;
mod suggest;
mod tabs;
mod template;

pub use address::{mirror_address, query_from_address, AddressMirror};
pub use autocomplete::{AutoCompleteController, AutoCompleteEffect, AutoCompleteEvent, SuggestionState};
pub use catalog::{EngineCatalog, HotkeyIndex};
pub use config::{ClientEnvironment, ResponseOrdering, SessionConfig};
pub use engine::{Engine, Viewport};
pub use error::{Result, SessionError};
pub use frames::{
    BrowsingContext, EmbeddedPanel, ExternalAction, ExternalLinkCard, FrameLifecycleManager, Panel,
    ReloadRequest,
};
pub use keys::{Focus, Key, KeyEvent, KeyOutcome, Modifiers};
pub use session::{KeyboardSubscription, SearchSession, SessionBuilder, SessionEffect, SessionEvent};
pub use state::{LoadState, SessionState};
pub use suggest::{parse_suggestions, HttpSuggestionSource, SuggestionSource, Suggestions, DEFAULT_ENDPOINT};
pub use tabs::{TabController, TabEffect};
pub use template::{UrlTemplater, PLACEHOLDER};
