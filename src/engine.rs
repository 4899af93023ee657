//! Search engine records.

use serde::{Deserialize, Serialize};

use crate::{Result, SessionError};

/// Viewport class used for the per-engine visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    Mobile,
    Desktop,
}

/// A configured external search provider.
///
/// Records come from the external catalog store and are consumed as-is;
/// [`Engine::validate`] is the only place their shape is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    /// Display name, also used as the engine id.
    pub name: String,
    /// Result page URL containing a `%s` placeholder for the query.
    #[serde(default, alias = "url")]
    pub url_template: String,
    /// Optional native-app deep link, also containing `%s`.
    #[serde(default, alias = "scheme")]
    pub url_scheme_template: Option<String>,
    /// Configured hotkey. Only its first character is used for dispatch.
    #[serde(default, alias = "key")]
    pub hotkey: String,
    /// Accent color (e.g. "#4285f4").
    #[serde(default)]
    pub color: String,
    /// Opaque icon reference handed to the renderer.
    #[serde(default, alias = "icon")]
    pub icon_ref: String,
    /// Whether the result page may be shown in an embedded panel.
    #[serde(default = "default_true")]
    pub embeddable: bool,
    /// Whether the panel is mounted ahead of selection once activated.
    #[serde(default)]
    pub preload: bool,
    /// Sort key, higher first.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Disabled engines are dropped from the catalog.
    #[serde(default)]
    pub disabled: bool,
    /// Shown on mobile viewports.
    #[serde(default = "default_true")]
    pub mobile: bool,
    /// Shown on desktop viewports.
    #[serde(default = "default_true")]
    pub desktop: bool,
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

impl Engine {
    /// Creates an embeddable engine with default presentation metadata.
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        hotkey: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            url_scheme_template: None,
            hotkey: hotkey.into(),
            color: String::new(),
            icon_ref: String::new(),
            embeddable: true,
            preload: false,
            weight: 1.0,
            disabled: false,
            mobile: true,
            desktop: true,
        }
    }

    /// Sets whether the engine can be embedded.
    pub fn with_embeddable(mut self, embeddable: bool) -> Self {
        self.embeddable = embeddable;
        self
    }

    /// Sets the preload flag.
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Sets the sort weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the native scheme template.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.url_scheme_template = Some(scheme.into());
        self
    }

    /// Marks the engine disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Returns the lowercase first character of the hotkey, taken as is.
    pub fn hotkey_char(&self) -> Option<char> {
        self.hotkey.chars().next().and_then(|c| c.to_lowercase().next())
    }

    /// Returns whether the engine is shown on the given viewport.
    pub fn visible_on(&self, viewport: Viewport) -> bool {
        match viewport {
            Viewport::Mobile => self.mobile,
            Viewport::Desktop => self.desktop,
        }
    }

    /// Checks the fields the session depends on.
    pub fn validate(&self) -> Result<()> {
        if self.url_template.trim().is_empty() {
            return Err(SessionError::MissingUrlTemplate(self.name.clone()));
        }
        if !self.url_template.contains("%s") {
            return Err(SessionError::MissingPlaceholder(self.name.clone()));
        }
        if self.hotkey_char().is_none() {
            return Err(SessionError::MissingHotkey(self.name.clone()));
        }
        Ok(())
    }
}
