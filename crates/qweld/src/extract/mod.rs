//! Schema extraction
//!
//! Walks a source tree and collects raw [`SchemaCandidate`]s from annotated
//! Rust structs and `*.qweld.toml` descriptors. Only structure is classified
//! here; all semantic checks happen in [`crate::validate`].

pub mod cfg;
pub mod descriptor;
pub mod source;

use crate::ir::SchemaCandidate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

pub use cfg::CfgSet;
pub use descriptor::parse_descriptor;
pub use source::{base_field, candidate_from_struct, extract_source, module_path_for};

/// Structural errors found while reading the source tree
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}:{column}: failed to parse: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{}:{line}: invalid qweld annotation: {message}", path.display())]
    Annotation {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: invalid descriptor: {message}", path.display())]
    Descriptor { path: PathBuf, message: String },
}

impl ExtractError {
    /// File the error was found in
    pub fn path(&self) -> &Path {
        match self {
            ExtractError::Io { path, .. }
            | ExtractError::Parse { path, .. }
            | ExtractError::Annotation { path, .. }
            | ExtractError::Descriptor { path, .. } => path,
        }
    }
}

/// Options controlling extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Active build configuration
    pub cfg: CfgSet,
    /// Crate name the marker base type is imported from
    pub runtime_crate: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            cfg: CfgSet::new(),
            runtime_crate: "qweld_runtime".to_string(),
        }
    }
}

impl ExtractOptions {
    /// Set the active build configuration tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cfg = CfgSet::from_tags(tags);
        self
    }

    /// Set the crate the marker base type comes from
    pub fn runtime_crate(mut self, name: impl Into<String>) -> Self {
        self.runtime_crate = name.into();
        self
    }
}

/// Result of extracting a tree
///
/// Files with structural errors contribute no candidates; their errors are
/// kept so the caller can report them together with validation errors.
#[derive(Debug, Default)]
pub struct Extraction {
    pub candidates: Vec<SchemaCandidate>,
    pub errors: Vec<ExtractError>,
}

impl Extraction {
    /// Merge another extraction into this one
    pub fn merge(&mut self, other: Extraction) {
        self.candidates.extend(other.candidates);
        self.errors.extend(other.errors);
    }

    /// Whether no structural errors were found
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "target"
}

/// Extract candidates from every Rust file and descriptor under `root`
///
/// Hidden directories and `target/` are skipped. Files are visited in
/// file-name order so results are stable across runs.
pub fn extract_tree(root: &Path, options: &ExtractOptions) -> Extraction {
    let mut extraction = Extraction::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                extraction.errors.push(ExtractError::Io {
                    path,
                    source: err.into(),
                });
                continue;
            }
        };

        if entry.file_type().is_file() {
            extraction.merge(extract_file(root, entry.path(), options));
        }
    }

    tracing::debug!(
        root = %root.display(),
        candidates = extraction.candidates.len(),
        errors = extraction.errors.len(),
        "extracted source tree"
    );

    extraction
}

/// Extract candidates from a single file under `root`
///
/// Files that are neither Rust sources nor descriptors yield nothing.
pub fn extract_file(root: &Path, path: &Path, options: &ExtractOptions) -> Extraction {
    let is_descriptor = descriptor::is_descriptor(path);
    let is_rust = path.extension().is_some_and(|ext| ext == "rs");
    if !is_descriptor && !is_rust {
        return Extraction::default();
    }

    tracing::debug!(path = %path.display(), "scanning file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(source) => {
            return Extraction {
                candidates: Vec::new(),
                errors: vec![ExtractError::Io {
                    path: path.to_path_buf(),
                    source,
                }],
            }
        }
    };

    if is_descriptor {
        return match parse_descriptor(&content, path) {
            Ok(candidates) => Extraction {
                candidates,
                errors: Vec::new(),
            },
            Err(err) => Extraction {
                candidates: Vec::new(),
                errors: vec![err],
            },
        };
    }

    extract_source(&content, path, &module_path_for(root, path), options)
}
