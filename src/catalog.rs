//! Session-scoped engine catalog and hotkey index.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::engine::Viewport;
use crate::{Engine, Result, SessionError};

/// Immutable, ordered snapshot of the enabled engines for one session.
///
/// Engines are sorted by descending weight, then ascending name. Index 0 is
/// the primary tab.
#[derive(Debug, Clone)]
pub struct EngineCatalog {
    engines: Vec<Engine>,
}

impl EngineCatalog {
    /// Builds a catalog from raw records, dropping disabled ones.
    ///
    /// Fails on the first enabled record missing a hotkey or URL template,
    /// or when nothing is left after filtering.
    pub fn from_engines(engines: Vec<Engine>) -> Result<Self> {
        let mut engines: Vec<Engine> = engines.into_iter().filter(|e| !e.disabled).collect();
        for engine in &engines {
            engine.validate()?;
        }
        if engines.is_empty() {
            return Err(SessionError::EmptyCatalog);
        }

        engines.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.name.cmp(&b.name))
        });
        debug!("Loaded catalog with {} engines", engines.len());

        Ok(Self { engines })
    }

    /// Parses a JSON array of engine records.
    pub fn from_json(json: &str) -> Result<Self> {
        let engines: Vec<Engine> = serde_json::from_str(json)?;
        Self::from_engines(engines)
    }

    /// Reads a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Returns the number of engines. Always at least one.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Always false for a successfully built catalog.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Returns the engine at `index`.
    pub fn get(&self, index: usize) -> Option<&Engine> {
        self.engines.get(index)
    }

    /// Returns the engines in tab order.
    pub fn engines(&self) -> &[Engine] {
        &self.engines
    }

    /// Returns the tab indices shown on the given viewport.
    pub fn visible_indices(&self, viewport: Viewport) -> Vec<usize> {
        self.engines
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visible_on(viewport))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Maps a lowercase hotkey character to the tabs whose hotkey starts with it.
#[derive(Debug, Clone, Default)]
pub struct HotkeyIndex {
    slots: HashMap<char, Vec<usize>>,
}

impl HotkeyIndex {
    /// Derives the index from a catalog. Indices within a slot are ascending.
    pub fn from_catalog(catalog: &EngineCatalog) -> Self {
        let mut slots: HashMap<char, Vec<usize>> = HashMap::new();
        for (index, engine) in catalog.engines().iter().enumerate() {
            if let Some(c) = engine.hotkey_char() {
                slots.entry(c).or_default().push(index);
            }
        }
        Self { slots }
    }

    /// Returns the tabs sharing `c` (case-insensitive).
    pub fn get(&self, c: char) -> &[usize] {
        c.to_lowercase()
            .next()
            .and_then(|c| self.slots.get(&c))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns whether any tab uses `c`.
    pub fn contains(&self, c: char) -> bool {
        !self.get(c).is_empty()
    }

    /// Scans circularly from `active + 1` and returns the first tab bound to
    /// `c`. The result equals `active` only when it is the sole match.
    pub fn next_match(&self, c: char, active: usize) -> Option<usize> {
        let slot = self.get(c);
        slot.iter()
            .copied()
            .find(|&i| i > active)
            .or_else(|| slot.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(name: &str, hotkey: &str, weight: f64) -> Engine {
        Engine::new(name, format!("https://{}.com/?q=%s", name.to_lowercase()), hotkey)
            .with_weight(weight)
    }

    #[test]
    fn test_catalog_sorts_by_weight_then_name() {
        let catalog = EngineCatalog::from_engines(vec![
            engine("Bravo", "b", 1.0),
            engine("Alpha", "a", 1.0),
            engine("Heavy", "h", 5.0),
        ])
        .unwrap();
        let names: Vec<_> = catalog.engines().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Heavy", "Alpha", "Bravo"]);
    }

    #[test]
    fn test_catalog_filters_disabled() {
        let catalog = EngineCatalog::from_engines(vec![
            engine("A", "a", 1.0),
            engine("B", "", 1.0).disabled(),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().name, "A");
    }

    #[test]
    fn test_catalog_fails_fast_on_missing_hotkey() {
        let result = EngineCatalog::from_engines(vec![engine("A", "a", 1.0), engine("B", "", 1.0)]);
        assert!(matches!(result, Err(SessionError::MissingHotkey(name)) if name == "B"));
    }

    #[test]
    fn test_catalog_empty() {
        let result = EngineCatalog::from_engines(vec![engine("A", "a", 1.0).disabled()]);
        assert!(matches!(result, Err(SessionError::EmptyCatalog)));
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {"name":"Google","url":"https://google.com/search?q=%s","key":"g","weight":2},
            {"name":"Bing","url":"https://bing.com/search?q=%s","key":"b"}
        ]"#;
        let catalog = EngineCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().name, "Google");
    }

    #[test]
    fn test_catalog_from_json_invalid() {
        assert!(matches!(
            EngineCatalog::from_json("not json"),
            Err(SessionError::Parse(_))
        ));
    }

    #[test]
    fn test_catalog_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engines.json");
        std::fs::write(&path, r#"[{"name":"A","url":"https://a.com/?q=%s","key":"a"}]"#).unwrap();
        let catalog = EngineCatalog::from_path(&path).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_visible_indices() {
        let mut desktop_only = engine("B", "b", 1.0);
        desktop_only.mobile = false;
        let catalog = EngineCatalog::from_engines(vec![engine("A", "a", 1.0), desktop_only]).unwrap();
        assert_eq!(catalog.visible_indices(Viewport::Mobile), vec![0]);
        assert_eq!(catalog.visible_indices(Viewport::Desktop), vec![0, 1]);
    }

    #[test]
    fn test_hotkey_index_groups_by_first_char() {
        let catalog = EngineCatalog::from_engines(vec![
            engine("Google", "g", 3.0),
            engine("GitHub", "gh", 2.0),
            engine("Bing", "B", 1.0),
        ])
        .unwrap();
        let index = HotkeyIndex::from_catalog(&catalog);
        assert_eq!(index.get('g'), &[0, 1]);
        assert_eq!(index.get('B'), &[2]);
        assert!(index.contains('b'));
        assert!(!index.contains('z'));
    }

    #[test]
    fn test_hotkey_next_match_cycles() {
        let catalog = EngineCatalog::from_engines(vec![
            engine("A1", "a", 4.0),
            engine("B", "b", 3.0),
            engine("A2", "a", 2.0),
        ])
        .unwrap();
        let index = HotkeyIndex::from_catalog(&catalog);
        assert_eq!(index.next_match('a', 0), Some(2));
        assert_eq!(index.next_match('a', 2), Some(0));
        assert_eq!(index.next_match('a', 1), Some(2));
        assert_eq!(index.next_match('b', 1), Some(1));
        assert_eq!(index.next_match('z', 0), None);
    }
}
