use super::{ConfigValidator, PipelineConfig};
use crate::error::{ClimpackError, ErrorCode, Result};
use std::path::{Path, PathBuf};

/// Builds the effective [`PipelineConfig`]: built-in defaults, then an
/// optional TOML file, then caller overrides, then validation.
pub struct ConfigLoader {
    config: PipelineConfig,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Replace the defaults with the contents of a TOML file.
    ///
    /// Fields absent from the file keep their default values.
    pub fn load_file(mut self, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClimpackError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("Config file not found: {}", path.display()),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        self.config = Self::parse(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(self)
    }

    pub fn parse(content: &str) -> Result<PipelineConfig> {
        let config: PipelineConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.config.working_dir = dir;
        }
        self
    }

    /// Apply in-place overrides, typically from command-line flags
    pub fn override_with<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(&mut PipelineConfig),
    {
        apply(&mut self.config);
        self
    }

    pub fn build(self) -> Result<PipelineConfig> {
        ConfigValidator::validate(&self.config)?;
        Ok(self.config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
