use crate::error::{OutlineError, Result};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for outline parsing and workspace scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Markers used to tag Python test classes and test functions
    pub test_markers: TestMarkers,

    /// Extra extension → family mappings (e.g. `"jsm" = "javascript"`)
    pub extension_overrides: BTreeMap<String, String>,

    /// Files above this size are skipped by workspace scans (0 = no limit)
    pub max_file_bytes: u64,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            test_markers: TestMarkers::default(),
            extension_overrides: BTreeMap::new(),
            max_file_bytes: 1_048_576,
        }
    }
}

/// Naming conventions of the built-in Python test framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestMarkers {
    /// A class whose name starts with this is a test class
    pub class_prefix: String,

    /// A class with a base identifier equal to this is a test class
    pub base_name: String,

    /// A function or test-class method whose name starts with this is a test
    pub function_prefix: String,
}

impl Default for TestMarkers {
    fn default() -> Self {
        Self {
            class_prefix: "Test".to_string(),
            base_name: "TestCase".to_string(),
            function_prefix: "test".to_string(),
        }
    }
}

impl OutlineConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| OutlineError::io(path, e))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| OutlineError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Family for an extension, honoring overrides before the built-in table
    #[must_use]
    pub fn language_for_extension(&self, ext: &str) -> Language {
        let ext = ext.to_lowercase();
        self.extension_overrides
            .get(&ext)
            .and_then(|name| Language::from_name(name))
            .unwrap_or_else(|| Language::from_extension(&ext))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let markers = &self.test_markers;
        if markers.class_prefix.is_empty() {
            return Err(OutlineError::invalid_config(
                "test_markers.class_prefix must not be empty",
            ));
        }
        if markers.base_name.is_empty() {
            return Err(OutlineError::invalid_config(
                "test_markers.base_name must not be empty",
            ));
        }
        if markers.function_prefix.is_empty() {
            return Err(OutlineError::invalid_config(
                "test_markers.function_prefix must not be empty",
            ));
        }

        for (ext, name) in &self.extension_overrides {
            if Language::from_name(name).is_none() {
                return Err(OutlineError::invalid_config(format!(
                    "extension_overrides.{ext}: unknown family '{name}'"
                )));
            }
        }

        Ok(())
    }
}
