//! Configuration for document filling.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields a working configuration:
//!
//! ```
//! let config = docfill::Config::from_json_str("{}").unwrap();
//! assert_eq!(config.document.placeholder_pattern, "{{SECTION_CONTENT}}");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default marker that flags where generated content goes.
pub const DEFAULT_PLACEHOLDER: &str = "{{SECTION_CONTENT}}";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document structure settings
    pub document: DocumentConfig,
    /// Text generation settings
    pub generation: GenerationConfig,
    /// Table calculation settings
    pub tables: TableOptions,
}

impl Config {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.document.placeholder_pattern.is_empty() {
            return Err(Error::Config("placeholder_pattern must not be empty".into()));
        }
        if self.document.section_heading_styles.is_empty() {
            return Err(Error::Config(
                "section_heading_styles must name at least one style".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.generation.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(Error::Config(format!(
                "top_p {} is outside 0.0..=1.0",
                self.generation.top_p
            )));
        }
        Ok(())
    }

    /// Set the placeholder marker.
    pub fn with_placeholder(mut self, marker: impl Into<String>) -> Self {
        self.document.placeholder_pattern = marker.into();
        self
    }

    /// Set the heading style names that start a section.
    pub fn with_heading_styles<S: Into<String>>(
        mut self,
        styles: impl IntoIterator<Item = S>,
    ) -> Self {
        self.document.section_heading_styles = styles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation.temperature = temperature;
        self
    }

    /// Set the generation token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.generation.max_tokens = max_tokens;
        self
    }

    /// Set the number of generation attempts.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.generation.max_retries = retries;
        self
    }

    /// Enable or disable parallel table processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.tables.parallel = parallel;
        self
    }

    /// Process tables on the calling thread only.
    pub fn sequential(mut self) -> Self {
        self.tables.parallel = false;
        self
    }
}

/// Document structure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Paragraph style names that begin a new section
    pub section_heading_styles: Vec<String>,
    /// Substring marking where content is to be inserted
    pub placeholder_pattern: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            section_heading_styles: (1..=3).map(|level| format!("Heading {}", level)).collect(),
            placeholder_pattern: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Attempts before giving up on a generation call
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            top_p: 0.9,
            max_retries: 3,
        }
    }
}

/// Table calculation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Process tables in parallel with rayon
    pub parallel: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}
