//! BindingBuilder for build.rs scripts and tools
//!
//! Runs the whole pipeline (extract, validate, emit, write) for a source
//! tree. Generation is fail-closed: if any file is malformed or any schema is
//! invalid, every problem is reported and nothing is written.

use crate::build::config::{ConfigError, GeneratorConfig, CONFIG_FILE};
use crate::codegen::{generate_bindings, CodegenOptions, GeneratedFile, OutputNames};
use crate::extract::{extract_tree, ExtractError};
use crate::ir::{BindingSchema, SchemaCandidate};
use crate::validate::{validate_all, ValidationError};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single problem that blocked generation
#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Structural(#[from] ExtractError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// All problems of a rejected run
#[derive(Debug)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.0.len())?;
        for diagnostic in &self.0 {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}

/// Errors that can occur during generation
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarMissing(String),

    /// Source directory does not exist
    #[error("source directory not found: {}", .0.display())]
    MissingSourceDir(PathBuf),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Extraction or validation failed; nothing was written
    #[error("binding generation rejected with {0}")]
    Rejected(Diagnostics),

    /// An output file could not be written
    #[error("failed to write {} for {schema}: {source}", path.display())]
    Write {
        schema: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema could not be serialized
    #[error("failed to serialize schema {schema}: {source}")]
    Serialize {
        schema: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GenerateError {
    /// Diagnostics of a rejected run
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            GenerateError::Rejected(diagnostics) => &diagnostics.0,
            _ => &[],
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Names of the schemas that were emitted, in emission order
    pub schemas: Vec<String>,
    /// Files whose content changed
    pub written: Vec<PathBuf>,
    /// Files that already had the generated content
    pub unchanged: Vec<PathBuf>,
}

impl GenerateReport {
    /// Every generated path, written or not
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.written.iter().chain(self.unchanged.iter())
    }
}

/// Builder for binding generation
///
/// # Example
/// ```ignore
/// use qweld::build::BindingBuilder;
///
/// fn main() {
///     BindingBuilder::from_env()
///         .and_then(|builder| builder.build())
///         .expect("Failed to generate bindings");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BindingBuilder {
    config: GeneratorConfig,
    candidates: Vec<SchemaCandidate>,
    scan_sources: bool,
    cargo_directives: bool,
    watch: Vec<PathBuf>,
}

impl BindingBuilder {
    /// Create a builder scanning `source_dir` with default settings
    pub fn new(source_dir: impl AsRef<Path>) -> Self {
        Self::from_config(GeneratorConfig {
            source_dir: source_dir.as_ref().to_path_buf(),
            ..GeneratorConfig::default()
        })
    }

    /// Create a builder from a loaded configuration
    pub fn from_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            candidates: Vec::new(),
            scan_sources: true,
            cargo_directives: false,
            watch: Vec::new(),
        }
    }

    /// Create a builder from a `qweld.toml` file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, GenerateError> {
        let path = path.as_ref();
        let config = GeneratorConfig::from_file(path)?;
        Ok(Self::from_config(config).watch(path))
    }

    /// Create a builder for a build script
    ///
    /// Loads `qweld.toml` from `CARGO_MANIFEST_DIR` when present and enables
    /// `cargo:` directives.
    pub fn from_env() -> Result<Self, GenerateError> {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR")
            .map_err(|_| GenerateError::EnvVarMissing("CARGO_MANIFEST_DIR".to_string()))?;
        let manifest_path = Path::new(&manifest_dir);

        let config = GeneratorConfig::from_dir(manifest_path)?;
        Ok(Self::from_config(config)
            .watch(manifest_path.join(CONFIG_FILE))
            .cargo_directives(true))
    }

    /// Write all files into one directory instead of next to their sources
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.out_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add an active build configuration tag (`flag` or `key=value`)
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.tags.push(tag.into());
        self
    }

    /// Set the prefix of generated files and trampoline symbols
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// Set the crate the marker base type and registry come from
    pub fn runtime_crate(mut self, name: impl Into<String>) -> Self {
        self.config.runtime_crate = name.into();
        self
    }

    /// Set the Qt base class and the header declaring it
    pub fn base_class(mut self, class: impl Into<String>, include: impl Into<String>) -> Self {
        self.config.native.base_class = class.into();
        self.config.native.base_include = include.into();
        self
    }

    /// Also write a JSON dump of every validated schema
    pub fn emit_schema(mut self, enabled: bool) -> Self {
        self.config.emit_schema = enabled;
        self
    }

    /// Add a candidate built in code or parsed elsewhere
    pub fn candidate(mut self, candidate: SchemaCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Only generate the candidates added with [`Self::candidate`]
    pub fn skip_source_scan(mut self) -> Self {
        self.scan_sources = false;
        self
    }

    /// Print `cargo:rerun-if-changed` and `cargo:warning` directives
    pub fn cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    /// Add a file to watch for rebuilds
    pub fn watch(mut self, path: impl AsRef<Path>) -> Self {
        self.watch.push(path.as_ref().to_path_buf());
        self
    }

    /// The effective configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Extract and validate without writing anything
    ///
    /// # Errors
    /// Returns [`GenerateError::Rejected`] with every structural and
    /// validation error found.
    pub fn check(&self) -> Result<Vec<BindingSchema>, GenerateError> {
        let mut candidates = Vec::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        if self.scan_sources {
            let source_dir = &self.config.source_dir;
            if !source_dir.is_dir() {
                return Err(GenerateError::MissingSourceDir(source_dir.clone()));
            }

            let extraction = extract_tree(source_dir, &self.config.extract_options());
            for error in &extraction.errors {
                tracing::warn!(path = %error.path().display(), "{}", error);
            }
            diagnostics.extend(extraction.errors.into_iter().map(Diagnostic::from));
            candidates.extend(extraction.candidates);
        }

        candidates.extend(self.candidates.iter().cloned());

        let schemas = match validate_all(&candidates) {
            Ok(schemas) => schemas,
            Err(errors) => {
                diagnostics.extend(errors.into_iter().map(Diagnostic::from));
                Vec::new()
            }
        };

        if !diagnostics.is_empty() {
            if self.cargo_directives {
                for diagnostic in &diagnostics {
                    println!("cargo:warning={}", diagnostic);
                }
            }
            return Err(GenerateError::Rejected(Diagnostics(diagnostics)));
        }

        Ok(schemas)
    }

    /// Run the pipeline and write the generated files
    ///
    /// Files whose content is unchanged are left untouched.
    pub fn build(self) -> Result<GenerateReport, GenerateError> {
        if self.cargo_directives {
            if self.scan_sources {
                println!("cargo:rerun-if-changed={}", self.config.source_dir.display());
            }
            for path in &self.watch {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }

        let schemas = self.check()?;
        let options = self.config.codegen_options();
        let mut report = GenerateReport::default();

        for schema in &schemas {
            let out_dir = self.output_dir(schema);
            let mut files = generate_bindings(schema, &options);

            if self.config.emit_schema {
                files.push(schema_file(schema, &options)?);
            }

            fs::create_dir_all(&out_dir).map_err(|source| GenerateError::Write {
                schema: schema.name.clone(),
                path: out_dir.clone(),
                source,
            })?;

            for file in files {
                let path = out_dir.join(&file.name);
                let changed = write_if_changed(&path, &file.content).map_err(|source| GenerateError::Write {
                    schema: schema.name.clone(),
                    path: path.clone(),
                    source,
                })?;

                if changed {
                    tracing::debug!(path = %path.display(), "wrote generated file");
                    report.written.push(path);
                } else {
                    report.unchanged.push(path);
                }
            }

            tracing::info!(schema = %schema.name, out_dir = %out_dir.display(), "generated bindings");
            report.schemas.push(schema.name.clone());
        }

        Ok(report)
    }

    /// Directory the files of a schema go to
    fn output_dir(&self, schema: &BindingSchema) -> PathBuf {
        if let Some(out_dir) = &self.config.out_dir {
            return out_dir.clone();
        }

        schema
            .source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.source_dir.clone())
    }
}

/// JSON dump of a validated schema
fn schema_file(schema: &BindingSchema, options: &CodegenOptions) -> Result<GeneratedFile, GenerateError> {
    let content = serde_json::to_string_pretty(schema).map_err(|source| GenerateError::Serialize {
        schema: schema.name.clone(),
        source,
    })?;

    Ok(GeneratedFile {
        name: OutputNames::new(schema, options).schema,
        content: content + "\n",
    })
}

/// Write a file unless it already holds `content`
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, content: &str) -> std::io::Result<bool> {
    match fs::read_to_string(path) {
        Ok(existing) if existing == content => Ok(false),
        _ => {
            fs::write(path, content)?;
            Ok(true)
        }
    }
}
