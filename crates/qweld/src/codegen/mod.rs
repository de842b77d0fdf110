//! Code generation for qweld bindings
//!
//! This module provides generators for:
//! - the C-ABI header and the Qt C++ class ([`NativeEmitter`])
//! - the Rust host glue ([`HostEmitter`])
//!
//! Both run independently on the same validated schema and agree on names
//! through [`NativeSymbols`].

pub mod host;
pub mod native;
pub mod symbols;

pub use host::HostEmitter;
pub use native::{NativeEmitter, NativeOutput};
pub use symbols::{CodegenOptions, NativeSymbols, OutputNames, STRING_FREE_SYMBOL};

use crate::ir::BindingSchema;

/// A generated file, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

/// Generate every artifact of one schema
///
/// Files come in a fixed order: header, C++ source, host glue.
pub fn generate_bindings(schema: &BindingSchema, options: &CodegenOptions) -> Vec<GeneratedFile> {
    let names = OutputNames::new(schema, options);
    let symbols = NativeSymbols::new(schema, options);
    let native = NativeEmitter::new(schema, &symbols, options).generate();
    let host = HostEmitter::new(schema, &symbols, options).generate();

    vec![
        GeneratedFile {
            name: names.header,
            content: native.header,
        },
        GeneratedFile {
            name: names.source,
            content: native.source,
        },
        GeneratedFile {
            name: names.host,
            content: host,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{SemanticType, Slot};

    #[test]
    fn test_generate_bindings() {
        let schema = BindingSchema::new("Counter")
            .property("count", SemanticType::Int)
            .slot(Slot::new("increment").returns(SemanticType::Int));

        let files = generate_bindings(&schema, &CodegenOptions::default());
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["qweld-counter.h", "qweld-counter.cpp", "qweld_counter.rs"]);

        // Both sides agree on the trampoline symbol
        assert!(files[0].content.contains("int qweld_counter_slot_increment(void* ptr);"));
        assert!(files[2]
            .content
            .contains("pub extern \"C\" fn qweld_counter_slot_increment("));

        assert_eq!(files, generate_bindings(&schema, &CodegenOptions::default()));
    }
}
