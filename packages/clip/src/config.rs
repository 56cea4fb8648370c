use animclip_parser::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reader policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Report unknown top-level keys instead of ignoring them
    pub strict_sections: bool,

    /// Deepest allowed nesting of objects and arrays
    pub max_nesting_depth: usize,

    /// Clip name used when the header has none and no source name is known
    pub fallback_name: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            strict_sections: false,
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            fallback_name: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid reader config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReaderConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn strict(mut self) -> Self {
        self.strict_sections = true;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }
}
