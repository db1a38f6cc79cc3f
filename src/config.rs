//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.json` from the content root.
//! The file is optional: when it is absent the stock defaults are used as-is,
//! which is the one place where loading recovers instead of failing.
//!
//! ## Layering
//!
//! The stock defaults are an immutable [`SiteConfig::default()`] value. At load
//! time it is serialized to JSON, the user's file is merged on top key by key
//! ([`merge_json`]), and the result is deserialized and validated. Nothing
//! consults the defaults after that point.
//!
//! ## Configuration Options
//!
//! ```json
//! {
//!   "site_name": "My Site",
//!   "site_tagline": "",
//!   "meta_description": "",
//!   "contact_blurb": "We welcome collaborations and inquiries.",
//!   "domain": "",
//!   "newsletter_mode": "local",
//!   "newsletter_provider_url": "",
//!   "layout_variant": "standard",
//!   "footer_note": "",
//!   "address": "",
//!   "show_digest_home": false,
//!   "logo_text": "",
//!   "nav_cta_text": "Get in touch",
//!   "nav_cta_target": "contact",
//!   "forbidden_link_targets": [],
//!   "theme": {
//!     "primary": "#65141c",
//!     "primary_dark": "#3a1016",
//!     "primary_bright": "#92202b",
//!     "background": "#f3f1f0",
//!     "paper": "#f9f8f7",
//!     "accent": "#e0b15a",
//!     "text_main": "#1a1a1a",
//!     "text_muted": "#4a4a4a"
//!   }
//! }
//! ```
//!
//! Files are sparse: override only the keys you need. Unknown keys are
//! rejected to catch typos early. `layout_variant` is the exception to strict
//! parsing: an unrecognized value selects the standard layout.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the site configuration inside the content root.
pub const SITE_CONFIG_FILE: &str = "site.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Root-page composition styles.
///
/// Only the site root is affected; every other page uses the standard hero +
/// sections composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayoutVariant {
    #[default]
    Standard,
    Linkhub,
    Profile,
    MesciaLanding,
    Archive,
}

impl LayoutVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutVariant::Standard => "standard",
            LayoutVariant::Linkhub => "linkhub",
            LayoutVariant::Profile => "profile",
            LayoutVariant::MesciaLanding => "mescia_landing",
            LayoutVariant::Archive => "archive",
        }
    }

    /// Parse a configured variant name. Unknown names select `Standard`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "linkhub" => LayoutVariant::Linkhub,
            "profile" => LayoutVariant::Profile,
            "mescia_landing" => LayoutVariant::MesciaLanding,
            "archive" => LayoutVariant::Archive,
            _ => LayoutVariant::Standard,
        }
    }
}

impl From<String> for LayoutVariant {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<LayoutVariant> for String {
    fn from(variant: LayoutVariant) -> Self {
        variant.as_str().to_string()
    }
}

/// Site configuration loaded from `site.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site name shown in the header eyebrow, footer and linkhub.
    pub site_name: String,
    pub site_tagline: String,
    /// Content of the `<meta name="description">` tag on every document.
    pub meta_description: String,
    /// Short paragraph used by the linkhub and profile layouts.
    pub contact_blurb: String,
    /// Public domain linked from the footer. A bare host gets `https://`.
    pub domain: String,
    /// `local` posts signups to the generated `subscribe.php`; anything else
    /// posts to `newsletter_provider_url` when one is set.
    pub newsletter_mode: String,
    pub newsletter_provider_url: String,
    pub layout_variant: LayoutVariant,
    pub footer_note: String,
    pub address: String,
    /// Render `digest_list` sections on the root page. Accepts a boolean or
    /// one of the strings `1`, `true`, `yes`, `on`.
    #[serde(deserialize_with = "deserialize_flag")]
    pub show_digest_home: bool,
    /// Header logo text; falls back to `site_name` when empty.
    pub logo_text: String,
    pub nav_cta_text: String,
    /// Page slug the header call-to-action points to.
    pub nav_cta_target: String,
    /// Substrings that `verify` rejects in any emitted link.
    pub forbidden_link_targets: Vec<String>,
    pub theme: ThemeConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "My Site".to_string(),
            site_tagline: String::new(),
            meta_description: String::new(),
            contact_blurb: "We welcome collaborations and inquiries.".to_string(),
            domain: String::new(),
            newsletter_mode: "local".to_string(),
            newsletter_provider_url: String::new(),
            layout_variant: LayoutVariant::Standard,
            footer_note: String::new(),
            address: String::new(),
            show_digest_home: false,
            logo_text: String::new(),
            nav_cta_text: "Get in touch".to_string(),
            nav_cta_target: "contact".to_string(),
            forbidden_link_targets: Vec::new(),
            theme: ThemeConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site_name must not be empty".into(),
            ));
        }
        let provider = self.newsletter_provider_url.trim();
        if !provider.is_empty()
            && !provider.starts_with("https://")
            && !provider.starts_with("http://")
        {
            return Err(ConfigError::Validation(
                "newsletter_provider_url must be an http(s) URL".into(),
            ));
        }
        for (name, value) in self.theme.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "theme.{name} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Whether newsletter signups go to the generated local endpoint.
    pub fn uses_local_newsletter(&self) -> bool {
        self.newsletter_mode.trim() == "local" || self.newsletter_provider_url.trim().is_empty()
    }

    /// Text shown as the header logo.
    pub fn logo(&self) -> &str {
        if self.logo_text.trim().is_empty() {
            &self.site_name
        } else {
            &self.logo_text
        }
    }

    /// Footer domain as a link target, if configured.
    pub fn domain_href(&self) -> Option<String> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            None
        } else if domain.contains("://") {
            Some(domain.to_string())
        } else {
            Some(format!("https://{domain}"))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Number(value) => value == 1,
        Flag::Text(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    })
}

/// Theme colours, emitted as CSS custom properties ahead of the stylesheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    pub primary: String,
    pub primary_dark: String,
    pub primary_bright: String,
    /// Page background ("cream").
    pub background: String,
    /// Card and panel background.
    pub paper: String,
    pub accent: String,
    pub text_main: String,
    pub text_muted: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: "#65141c".to_string(),
            primary_dark: "#3a1016".to_string(),
            primary_bright: "#92202b".to_string(),
            background: "#f3f1f0".to_string(),
            paper: "#f9f8f7".to_string(),
            accent: "#e0b15a".to_string(),
            text_main: "#1a1a1a".to_string(),
            text_muted: "#4a4a4a".to_string(),
        }
    }
}

impl ThemeConfig {
    fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("primary", &self.primary),
            ("primary_dark", &self.primary_dark),
            ("primary_bright", &self.primary_bright),
            ("background", &self.background),
            ("paper", &self.paper),
            ("accent", &self.accent),
            ("text_main", &self.text_main),
            ("text_muted", &self.text_muted),
        ]
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a JSON object.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> serde_json::Value {
    serde_json::to_value(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Objects are merged key-by-key (overlay keys override base keys).
/// - `null` in the overlay keeps the base value.
/// - Other overlay values replace base values entirely.
pub fn merge_json(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_json(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Load `site.json` from the content root as a raw JSON value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(content_root: &Path) -> Result<Option<serde_json::Value>, ConfigError> {
    let config_path = content_root.join(SITE_CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: serde_json::Value,
    overlay: Option<serde_json::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_json(base, ov),
        None => base,
    };
    let config: SiteConfig = serde_json::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

/// Load the site configuration from the content root.
pub fn load_config(content_root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(content_root)?;
    resolve_config(base, overlay)
}

/// Returns the stock `site.json` with every key at its default value.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_json() -> String {
    let mut json = serde_json::to_string_pretty(&SiteConfig::default())
        .expect("default config must serialize");
    json.push('\n');
    json
}

/// Generate CSS custom properties from the theme.
pub fn generate_theme_css(theme: &ThemeConfig) -> String {
    format!(
        r#":root {{
    --primary: {primary};
    --primary-dark: {primary_dark};
    --primary-bright: {primary_bright};
    --bg-color: {background};
    --paper: {paper};
    --accent: {accent};
    --text-main: {text_main};
    --text-muted: {text_muted};
}}"#,
        primary = theme.primary,
        primary_dark = theme.primary_dark,
        primary_bright = theme.primary_bright,
        background = theme.background,
        paper = theme.paper,
        accent = theme.accent,
        text_main = theme.text_main,
        text_muted = theme.text_muted,
    )
}
