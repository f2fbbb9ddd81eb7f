use serde::{Deserialize, Serialize};

use crate::error::{OdbError, OdbResult};

/// Configuration for a [`MemoryDb`](crate::MemoryDb).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryDbConfig {
    /// zstd level used when compressing stored objects.
    pub compression_level: i32,
}

impl Default for MemoryDbConfig {
    fn default() -> Self {
        Self {
            compression_level: odb_codec::DEFAULT_LEVEL,
        }
    }
}

impl MemoryDbConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> OdbResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| OdbError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OdbResult<()> {
        let range = odb_codec::level_range();
        if !range.contains(&self.compression_level) {
            return Err(OdbError::Config(format!(
                "compression_level {} outside {}..={}",
                self.compression_level,
                range.start(),
                range.end()
            )));
        }
        Ok(())
    }
}
