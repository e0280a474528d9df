//! # Application Configuration
//!
//! `AppConfig` bundles crawler settings, the section catalog and extraction
//! options into one TOML document. Every table and field is optional and
//! falls back to its default.
//!
//! ```toml
//! [crawler]
//! limit = 50
//! workers = 2
//!
//! [extraction]
//! min_sections = 3
//! include_lists = true
//!
//! [[sections]]
//! name = "Causes"
//! variants = ["Causes", "Etiology"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::crawler::CrawlerConfig;
use crate::error::{Error, Result};
use crate::sections::{ExtractOptions, SectionAggregator, SectionCatalog};

/// Complete configuration for a scraping run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listing, window, pacing and HTTP settings
    pub crawler: CrawlerConfig,

    /// Canonical sections and their title variants
    pub sections: SectionCatalog,

    /// Acceptance threshold and extraction policy
    pub extraction: ExtractOptions,
}

impl AppConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all settings are usable together
    pub fn validate(&self) -> Result<()> {
        self.crawler.validate()?;
        self.sections.validate().map_err(Error::Config)?;
        if self.extraction.min_sections == 0 {
            return Err(Error::Config(
                "extraction.min_sections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Aggregator built from the catalog and extraction options
    pub fn aggregator(&self) -> SectionAggregator {
        SectionAggregator::new(self.sections.clone(), self.extraction)
    }
}
