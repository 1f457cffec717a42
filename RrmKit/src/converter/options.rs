//! Conversion configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::formats::rrm::{DetectorConfig, RrmLayout};
use crate::mesh::AssemblyOptions;

/// Everything that steers one RRM -> mesh conversion.
///
/// All sections default, so a TOML file only needs the keys it overrides:
///
/// ```toml
/// allow_low_confidence = true
///
/// [layout]
/// vertex_count_field = 0xB8
///
/// [detector]
/// min_confidence = 0.8
///
/// [assembly]
/// dedup = "exact_attributes"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub layout: RrmLayout,
    pub detector: DetectorConfig,
    pub assembly: AssemblyOptions,
    /// Use the best candidate of a role even when it is below the threshold.
    pub allow_low_confidence: bool,
    /// UV candidate set committed for export.
    pub uv_set: Option<usize>,
}

impl ConversionOptions {
    /// Parse options from TOML text.
    ///
    /// # Errors
    /// `Config` if the text is not valid TOML for these options.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Config` if it does not parse.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded conversion options from {}", path.display());
        Ok(options)
    }
}
