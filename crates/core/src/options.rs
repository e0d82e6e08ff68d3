//! The options record read by the pipeline.
//!
//! Every filter gets its settings from [`Options`]; nothing is read from
//! process-wide state. Options deserialize from JSON with every key optional
//! and unknown keys ignored, so a partial file only overrides what it names.
//!
//! # Example
//!
//! ```rust
//! use lectern_core::Options;
//!
//! let options = Options::from_json_str(r#"{ "emphasis_max_length": 120, "image_fetch_timeout": "indefinite" }"#).unwrap();
//! assert_eq!(options.emphasis_max_length, 120);
//! assert!(options.image_fetch_timeout.is_none());
//! assert_eq!(options.table_scan_max_rows, 20);
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::color::Color;
use crate::scoring::ScoreConfig;
use crate::{LecternError, Result};

/// Default per-image fetch budget.
pub const DEFAULT_IMAGE_FETCH_TIMEOUT: Duration = Duration::from_millis(4000);

const DEFAULT_WHITELIST: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "title"]),
    ("abbr", &["title"]),
    ("audio", &["controls", "src"]),
    ("blockquote", &["cite"]),
    ("col", &["span"]),
    ("colgroup", &["span"]),
    ("data", &["value"]),
    ("del", &["cite", "datetime"]),
    ("embed", &["height", "src", "type", "width"]),
    ("iframe", &["allowfullscreen", "height", "src", "width"]),
    ("img", &["alt", "height", "sizes", "src", "srcset", "title", "width"]),
    ("ins", &["cite", "datetime"]),
    ("object", &["data", "height", "type", "width"]),
    ("ol", &["reversed", "start", "type"]),
    ("q", &["cite"]),
    ("source", &["media", "sizes", "src", "srcset", "type"]),
    ("td", &["colspan", "headers", "rowspan"]),
    ("th", &["colspan", "headers", "rowspan", "scope"]),
    ("time", &["datetime"]),
    ("track", &["default", "kind", "label", "src", "srclang"]),
    ("video", &["controls", "height", "poster", "src", "width"]),
];

/// Allowed attributes per tag. Tags missing from the map allow nothing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, Vec<String>>")]
pub struct AttributeWhitelist(HashMap<String, HashSet<String>>);

impl AttributeWhitelist {
    /// True if `attribute` may stay on a `tag` element.
    pub fn allows(&self, tag: &str, attribute: &str) -> bool {
        self.0
            .get(tag)
            .is_some_and(|allowed| allowed.contains(&attribute.to_ascii_lowercase()))
    }

    pub fn insert(&mut self, tag: &str, attribute: &str) {
        self.0
            .entry(tag.to_ascii_lowercase())
            .or_default()
            .insert(attribute.to_ascii_lowercase());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<HashMap<String, Vec<String>>> for AttributeWhitelist {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        let mut whitelist = AttributeWhitelist(HashMap::new());
        for (tag, attributes) in map {
            whitelist.0.entry(tag.to_ascii_lowercase()).or_default();
            for attribute in attributes {
                whitelist.insert(&tag, &attribute);
            }
        }
        whitelist
    }
}

impl Default for AttributeWhitelist {
    fn default() -> Self {
        let mut whitelist = AttributeWhitelist(HashMap::new());
        for (tag, attributes) in DEFAULT_WHITELIST {
            for attribute in *attributes {
                whitelist.insert(tag, attribute);
            }
        }
        whitelist
    }
}

/// Settings for one sanitization run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Background assumed behind elements that declare none (default: white).
    pub contrast_matte: Color,

    /// Text whose contrast against its background is below this is hidden (default: 1.2).
    pub min_contrast_ratio: f64,

    /// Per-image fetch budget; `None` waits indefinitely (default: 4 s).
    #[serde(deserialize_with = "deserialize_timeout")]
    pub image_fetch_timeout: Option<Duration>,

    /// Rows inspected when deciding whether a table is layout-only (default: 20).
    pub table_scan_max_rows: usize,

    /// Emphasis elements with more text than this are unwrapped (default: 200).
    pub emphasis_max_length: usize,

    /// Attributes allowed to survive, per tag.
    pub attribute_whitelist: AttributeWhitelist,

    /// Keep `iframe`/`embed`/`object` as opaque content (default: false).
    pub preserve_embeds: bool,

    /// Boilerplate scorer coefficients.
    pub scoring: ScoreConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            contrast_matte: Color::WHITE,
            min_contrast_ratio: 1.2,
            image_fetch_timeout: Some(DEFAULT_IMAGE_FETCH_TIMEOUT),
            table_scan_max_rows: 20,
            emphasis_max_length: 200,
            attribute_whitelist: AttributeWhitelist::default(),
            preserve_embeds: false,
            scoring: ScoreConfig::default(),
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Parses options from JSON; absent keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    ///
    /// # Errors
    ///
    /// [`LecternError::FileNotFound`] if the file does not exist,
    /// [`LecternError::ConfigError`] if it is not valid options JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LecternError::FileNotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
            .map_err(|e| LecternError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// `<config dir>/lectern/options.json`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lectern").join("options.json"))
    }

    /// Loads the default options file if present, otherwise the defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeoutRepr {
    Millis(u64),
    Keyword(String),
}

fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TimeoutRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TimeoutRepr::Millis(ms)) => Ok(Some(Duration::from_millis(ms))),
        Some(TimeoutRepr::Keyword(word)) if word.eq_ignore_ascii_case("indefinite") => Ok(None),
        Some(TimeoutRepr::Keyword(word)) => Err(serde::de::Error::custom(format!(
            "image_fetch_timeout must be milliseconds or \"indefinite\", got {:?}",
            word
        ))),
    }
}

/// Builder for [`Options`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use lectern_core::Options;
///
/// let options = Options::builder()
///     .preserve_embeds(true)
///     .image_fetch_timeout(Some(Duration::from_secs(2)))
///     .allow_attribute("div", "lang")
///     .build();
/// assert!(options.attribute_whitelist.allows("div", "lang"));
/// ```
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self { options: Options::default() }
    }

    pub fn contrast_matte(mut self, value: Color) -> Self {
        self.options.contrast_matte = value;
        self
    }

    pub fn min_contrast_ratio(mut self, value: f64) -> Self {
        self.options.min_contrast_ratio = value;
        self
    }

    pub fn image_fetch_timeout(mut self, value: Option<Duration>) -> Self {
        self.options.image_fetch_timeout = value;
        self
    }

    pub fn table_scan_max_rows(mut self, value: usize) -> Self {
        self.options.table_scan_max_rows = value;
        self
    }

    pub fn emphasis_max_length(mut self, value: usize) -> Self {
        self.options.emphasis_max_length = value;
        self
    }

    pub fn attribute_whitelist(mut self, value: AttributeWhitelist) -> Self {
        self.options.attribute_whitelist = value;
        self
    }

    /// Adds one allowed attribute to the current whitelist.
    pub fn allow_attribute(mut self, tag: &str, attribute: &str) -> Self {
        self.options.attribute_whitelist.insert(tag, attribute);
        self
    }

    pub fn preserve_embeds(mut self, value: bool) -> Self {
        self.options.preserve_embeds = value;
        self
    }

    pub fn scoring(mut self, value: ScoreConfig) -> Self {
        self.options.scoring = value;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.contrast_matte, Color::WHITE);
        assert_eq!(options.image_fetch_timeout, Some(DEFAULT_IMAGE_FETCH_TIMEOUT));
        assert!(options.attribute_whitelist.allows("a", "HREF"));
        assert!(!options.attribute_whitelist.allows("a", "onclick"));
        assert!(!options.attribute_whitelist.allows("div", "class"));
    }

    #[test]
    fn test_json_overrides_and_ignores_unknown_keys() {
        let json = r##"{
            "contrast_matte": "#000",
            "min_contrast_ratio": 2.5,
            "image_fetch_timeout": 1500,
            "attribute_whitelist": { "P": ["Class"] },
            "something_else": true
        }"##;
        let options = Options::from_json_str(json).unwrap();
        assert_eq!(options.contrast_matte, Color::BLACK);
        assert_eq!(options.min_contrast_ratio, 2.5);
        assert_eq!(options.image_fetch_timeout, Some(Duration::from_millis(1500)));
        assert!(options.attribute_whitelist.allows("p", "class"));
        assert!(!options.attribute_whitelist.allows("a", "href"));
        assert_eq!(options.emphasis_max_length, 200);
    }

    #[test]
    fn test_indefinite_timeout() {
        let options = Options::from_json_str(r#"{ "image_fetch_timeout": null }"#).unwrap();
        assert!(options.image_fetch_timeout.is_none());
        assert!(Options::from_json_str(r#"{ "image_fetch_timeout": "soon" }"#).is_err());
    }

    #[test]
    fn test_invalid_color_is_config_error() {
        let result = Options::from_json_str(r#"{ "contrast_matte": "plaid" }"#);
        assert!(matches!(result, Err(LecternError::ConfigError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "preserve_embeds": true }}"#).unwrap();
        let options = Options::from_file(file.path()).unwrap();
        assert!(options.preserve_embeds);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Options::from_file("/nonexistent/lectern/options.json");
        assert!(matches!(result, Err(LecternError::FileNotFound(_))));
    }

    #[test]
    fn test_builder() {
        let options = Options::builder().table_scan_max_rows(5).emphasis_max_length(10).build();
        assert_eq!(options.table_scan_max_rows, 5);
        assert_eq!(options.emphasis_max_length, 10);
    }
}
