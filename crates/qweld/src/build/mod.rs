//! Build utilities for qweld bindings
//!
//! This module provides utilities for use in build.rs scripts and tools:
//! - `qweld.toml` configuration loading
//! - BindingBuilder running extraction, validation and emission

pub mod builder;
pub mod config;

pub use builder::{write_if_changed, BindingBuilder, Diagnostic, Diagnostics, GenerateError, GenerateReport};
pub use config::{ConfigError, GeneratorConfig, NativeConfig, CONFIG_FILE};
