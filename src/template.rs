//! URL template resolution.

use crate::Engine;

/// The only placeholder a template may contain.
pub const PLACEHOLDER: &str = "%s";

/// Resolves engine URL templates against a query.
///
/// Every `%s` is replaced by the percent-encoded query; all other characters
/// pass through untouched. Sessions only resolve non-empty queries, but an
/// empty query is not an error: each placeholder is simply removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlTemplater;

impl UrlTemplater {
    /// Resolves the engine's result page URL.
    pub fn resolve(engine: &Engine, query: &str) -> String {
        Self::fill(&engine.url_template, query)
    }

    /// Resolves the engine's native deep link, if it has one.
    pub fn resolve_scheme(engine: &Engine, query: &str) -> Option<String> {
        engine
            .url_scheme_template
            .as_deref()
            .map(|template| Self::fill(template, query))
    }

    /// Substitutes the encoded query into a raw template.
    pub fn fill(template: &str, query: &str) -> String {
        // `str::replace` does not rescan inserted text, so a `%s` inside the
        // encoded query is never substituted again.
        template.replace(PLACEHOLDER, &urlencoding::encode(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_encodes_space() {
        let engine = Engine::new("X", "https://x.com/search?q=%s", "x");
        assert_eq!(
            UrlTemplater::resolve(&engine, "a b"),
            "https://x.com/search?q=a%20b"
        );
    }

    #[test]
    fn test_resolve_replaces_every_placeholder() {
        let engine = Engine::new("X", "https://x.com/%s?q=%s", "x");
        assert_eq!(UrlTemplater::resolve(&engine, "rust"), "https://x.com/rust?q=rust");
    }

    #[test]
    fn test_resolve_does_not_resubstitute() {
        let engine = Engine::new("X", "https://x.com/?q=%s", "x");
        assert_eq!(UrlTemplater::resolve(&engine, "%s"), "https://x.com/?q=%25s");
    }

    #[test]
    fn test_resolve_keeps_other_percent_sequences() {
        let engine = Engine::new("X", "https://x.com/?lang=%E4&q=%s&x=%d", "x");
        assert_eq!(
            UrlTemplater::resolve(&engine, "q"),
            "https://x.com/?lang=%E4&q=q&x=%d"
        );
    }

    #[test]
    fn test_resolve_reserved_characters() {
        let engine = Engine::new("X", "https://x.com/?q=%s", "x");
        assert_eq!(
            UrlTemplater::resolve(&engine, "a&b=c/d"),
            "https://x.com/?q=a%26b%3Dc%2Fd"
        );
    }

    #[test]
    fn test_resolve_unicode() {
        let engine = Engine::new("X", "https://x.com/?q=%s", "x");
        assert_eq!(UrlTemplater::resolve(&engine, "é"), "https://x.com/?q=%C3%A9");
    }

    #[test]
    fn test_fill_empty_query_removes_placeholder() {
        assert_eq!(UrlTemplater::fill("https://x.com/?q=%s", ""), "https://x.com/?q=");
    }

    #[test]
    fn test_resolve_scheme() {
        let engine = Engine::new("X", "https://x.com/?q=%s", "x").with_scheme("xapp://search/%s");
        assert_eq!(
            UrlTemplater::resolve_scheme(&engine, "a b"),
            Some("xapp://search/a%20b".to_string())
        );
    }

    #[test]
    fn test_resolve_scheme_absent() {
        let engine = Engine::new("X", "https://x.com/?q=%s", "x");
        assert_eq!(UrlTemplater::resolve_scheme(&engine, "a"), None);
    }
}
