//! Qweld: binding generator for Rust objects exposed as Qt/QML types
//!
//! A Rust struct carrying a `qweld_runtime::QmlObject` field is scanned for
//! annotated placeholder fields declaring properties, signals, slots and a
//! constructor. From the validated declaration qweld emits a Qt C++ class
//! with a C-ABI header and the Rust glue that forwards calls through the
//! runtime object registry.
//!
//! # Architecture
//!
//! - `ir`: Semantic types, candidates and validated binding schemas
//! - `extract`: Scanning Rust sources and `.qweld.toml` descriptors
//! - `validate`: Well-formedness rules turning candidates into schemas
//! - `codegen`: Native header/C++ and Rust host glue emitters
//! - `build`: Configuration and build script utilities
//!
//! # Usage
//!
//! In your application's `build.rs`:
//!
//! ```rust,ignore
//! use qweld::build::BindingBuilder;
//!
//! fn main() {
//!     BindingBuilder::from_env()
//!         .and_then(|builder| builder.out_dir("generated").build())
//!         .expect("Failed to generate bindings");
//! }
//! ```

pub mod build;
pub mod codegen;
pub mod extract;
pub mod ir;
pub mod validate;

// Re-export commonly used types
pub use build::{BindingBuilder, GenerateError, GenerateReport, GeneratorConfig};
pub use codegen::{generate_bindings, CodegenOptions, GeneratedFile, HostEmitter, NativeEmitter};
pub use extract::{extract_source, extract_tree, ExtractError, ExtractOptions, Extraction};
pub use ir::{BindingSchema, Constructor, Member, Role, SchemaCandidate, SemanticType, Signal, Slot};
pub use validate::{validate, validate_all, ValidationError, ValidationErrorKind};
