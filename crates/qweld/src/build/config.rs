//! Generator configuration from `qweld.toml`
//!
//! ```toml
//! source_dir = "src"
//! out_dir = "generated"      # default: next to each declaring file
//! tags = ["desktop", "feature=qml"]
//! file_prefix = "qweld"
//! runtime_crate = "qweld_runtime"
//! emit_schema = false
//!
//! [native]
//! base_class = "QQuickItem"
//! base_include = "QtQuick/QQuickItem"
//! ```

use crate::codegen::CodegenOptions;
use crate::extract::ExtractOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name
pub const CONFIG_FILE: &str = "qweld.toml";

/// Errors loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Native class settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeConfig {
    /// Qt class generated classes inherit from
    #[serde(default = "default_base_class")]
    pub base_class: String,
    /// Header declaring the base class
    #[serde(default = "default_base_include")]
    pub base_include: String,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            base_class: default_base_class(),
            base_include: default_base_include(),
        }
    }
}

/// Binding generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Root of the source tree to scan
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Output directory; unset writes next to each declaring file
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
    /// Active build configuration tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,
    /// Also write a JSON dump of every validated schema
    #[serde(default)]
    pub emit_schema: bool,
    #[serde(default)]
    pub native: NativeConfig,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_file_prefix() -> String {
    "qweld".to_string()
}

fn default_runtime_crate() -> String {
    "qweld_runtime".to_string()
}

fn default_base_class() -> String {
    "QQuickItem".to_string()
}

fn default_base_include() -> String {
    "QtQuick/QQuickItem".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            out_dir: None,
            tags: Vec::new(),
            file_prefix: default_file_prefix(),
            runtime_crate: default_runtime_crate(),
            emit_schema: false,
            native: NativeConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from TOML text
    ///
    /// `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a configuration file
    ///
    /// Relative directories are resolved against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content, path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        tracing::debug!(path = %path.display(), "loaded generator config");
        Ok(config.relative_to(base))
    }

    /// Load `qweld.toml` from a directory, falling back to defaults
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default().relative_to(dir))
        }
    }

    /// Resolve relative directories against `base`
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.source_dir.is_relative() {
            self.source_dir = base.join(&self.source_dir);
        }
        if let Some(out_dir) = self.out_dir.take() {
            self.out_dir = Some(if out_dir.is_relative() { base.join(out_dir) } else { out_dir });
        }
        self
    }

    /// Options for the emitters
    pub fn codegen_options(&self) -> CodegenOptions {
        CodegenOptions {
            file_prefix: self.file_prefix.clone(),
            runtime_crate: self.runtime_crate.clone(),
            base_class: self.native.base_class.clone(),
            base_include: self.native.base_include.clone(),
        }
    }

    /// Options for the extractor
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::default()
            .with_tags(&self.tags)
            .runtime_crate(self.runtime_crate.clone())
    }
}
