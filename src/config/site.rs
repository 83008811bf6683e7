//! Operator site configuration (`config.json`).
//!
//! The file is edited by hand and by the admin panel, so loading is
//! forgiving: a section with the wrong shape is logged and replaced by its
//! default instead of failing the build.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

use super::ConfigError;

/// Country used when `site_settings.target_country` is absent.
pub const DEFAULT_TARGET_COUNTRY: &str = "US";

/// `site_settings` section. Every key doubles as a `{{KEY}}` template slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteSettings(Map<String, Value>);

impl SiteSettings {
    fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn target_country(&self) -> &str {
        self.text("target_country").unwrap_or(DEFAULT_TARGET_COUNTRY)
    }

    pub fn domain(&self) -> &str {
        self.text("domain").unwrap_or("")
    }

    /// Brand name assembled from the two title halves.
    pub fn site_name(&self) -> String {
        format!(
            "{}{}",
            self.text("title_part_1").unwrap_or("Sport"),
            self.text("title_part_2").unwrap_or("Stream")
        )
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for SiteSettings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A hand-written content page (about, dmca, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPage {
    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub meta_title: String,

    #[serde(default)]
    pub meta_desc: String,

    #[serde(default)]
    pub content: String,
}

impl ContentPage {
    pub fn is_home(&self) -> bool {
        self.slug == "home"
    }
}

/// The parts of `config.json` the build reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteConfig {
    pub site_settings: SiteSettings,
    pub theme: Map<String, Value>,
    /// Kept raw: its shape is checked per country by the priority table.
    pub sport_priorities: Value,
    pub pages: Vec<ContentPage>,
}

impl SiteConfig {
    /// Read and parse `config.json`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        Ok(Self::from_value(value))
    }

    /// Like [`SiteConfig::from_file`], but any failure yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Proceeding without site config ({}): {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            warn!("Site config is not a JSON object, using defaults");
            return Self::default();
        };

        let site_settings = match root.remove("site_settings") {
            Some(Value::Object(map)) => SiteSettings::from(map),
            None => SiteSettings::default(),
            Some(_) => {
                warn!("site_settings is not an object, ignoring it");
                SiteSettings::default()
            }
        };

        let theme = match root.remove("theme") {
            Some(Value::Object(map)) => map,
            None => Map::new(),
            Some(_) => {
                warn!("theme is not an object, ignoring it");
                Map::new()
            }
        };

        let pages = match root.remove("pages") {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .enumerate()
                .filter_map(|(i, entry)| match serde_json::from_value::<ContentPage>(entry) {
                    Ok(page) if !page.slug.trim().is_empty() => Some(page),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Skipping page entry {}: {}", i, e);
                        None
                    }
                })
                .collect(),
            None => Vec::new(),
            Some(_) => {
                warn!("pages is not a list, ignoring it");
                Vec::new()
            }
        };

        Self {
            site_settings,
            theme,
            sport_priorities: root.remove("sport_priorities").unwrap_or(Value::Null),
            pages,
        }
    }

    pub fn target_country(&self) -> &str {
        self.site_settings.target_country()
    }

    pub fn home_page(&self) -> Option<&ContentPage> {
        self.pages.iter().find(|p| p.is_home())
    }

    /// Theme string value, if set and non-empty.
    pub fn theme_text(&self, key: &str) -> Option<&str> {
        self.theme
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}
