//! Names shared by the native and host emitters
//!
//! The native header declares C-ABI accessors that the host glue calls, and
//! the host glue exports trampolines that the native class calls. Both sides
//! derive their names from [`NativeSymbols`] so they always agree.

use crate::ir::naming::{file_stem, to_snake_case, upper_first};
use crate::ir::BindingSchema;
use serde::{Deserialize, Serialize};

/// Symbol exported by the runtime to release host-allocated strings
pub const STRING_FREE_SYMBOL: &str = "qweld_string_free";

/// Options shared by both emitters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenOptions {
    /// Prefix of generated file names and trampoline symbols
    pub file_prefix: String,
    /// Crate providing the registry and marshaling traits
    pub runtime_crate: String,
    /// Qt class the generated classes inherit from
    pub base_class: String,
    /// Header declaring `base_class`
    pub base_include: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            file_prefix: "qweld".to_string(),
            runtime_crate: "qweld_runtime".to_string(),
            base_class: "QQuickItem".to_string(),
            base_include: "QtQuick/QQuickItem".to_string(),
        }
    }
}

impl CodegenOptions {
    /// Absolute path of the runtime crate (`::qweld_runtime`)
    pub fn runtime_path(&self) -> String {
        format!("::{}", self.runtime_crate)
    }

    /// Prefix usable inside C and Rust identifiers
    pub fn symbol_prefix(&self) -> String {
        self.file_prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}

/// File names generated for one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    /// `qweld-counter.h`
    pub header: String,
    /// `qweld-counter.cpp`
    pub source: String,
    /// `qweld-counter.moc`, produced by moc from the source
    pub moc: String,
    /// `qweld_counter.rs`
    pub host: String,
    /// `qweld-counter.json`
    pub schema: String,
}

impl OutputNames {
    pub fn new(schema: &BindingSchema, options: &CodegenOptions) -> Self {
        let stem = format!("{}-{}", options.file_prefix, file_stem(&schema.name));
        Self {
            header: format!("{}.h", stem),
            source: format!("{}.cpp", stem),
            moc: format!("{}.moc", stem),
            host: format!("{}_{}.rs", options.symbol_prefix(), to_snake_case(&schema.name)),
            schema: format!("{}.json", stem),
        }
    }

    /// Include guard for the header (`QWELD_COUNTER_H`)
    pub fn header_guard(&self) -> String {
        self.header
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    }
}

/// C-ABI accessors of one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySymbols {
    pub property: String,
    /// `Counter_Count`
    pub getter: String,
    /// `Counter_SetCount`
    pub setter: String,
}

/// C-ABI emitter of one signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSymbol {
    pub signal: String,
    /// `Counter_CountChanged`
    pub emitter: String,
}

/// Host trampoline a slot dispatches through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSymbol {
    pub slot: String,
    /// `qweld_counter_slot_increment`
    pub trampoline: String,
}

/// Every symbol crossing the boundary for one schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSymbols {
    /// Qt class name
    pub class_name: String,
    /// Registration function (`Counter_RegisterType`)
    pub register: String,
    pub properties: Vec<PropertySymbols>,
    pub signals: Vec<SignalSymbol>,
    /// Host trampoline run after the native object is constructed
    pub constructor: String,
    /// Host trampoline run from the native destructor
    pub destroy: String,
    pub slots: Vec<SlotSymbol>,
    /// Runtime export releasing host-allocated strings
    pub string_free: String,
}

impl NativeSymbols {
    /// Derive the symbols of a validated schema
    pub fn new(schema: &BindingSchema, options: &CodegenOptions) -> Self {
        let class_name = schema.class_name();
        let host_prefix = format!("{}_{}", options.symbol_prefix(), to_snake_case(&schema.name));

        Self {
            register: format!("{}_RegisterType", class_name),
            properties: schema
                .properties
                .iter()
                .map(|p| PropertySymbols {
                    property: p.name.clone(),
                    getter: format!("{}_{}", class_name, upper_first(&p.name)),
                    setter: format!("{}_Set{}", class_name, upper_first(&p.name)),
                })
                .collect(),
            signals: schema
                .signals
                .iter()
                .map(|s| SignalSymbol {
                    signal: s.name.clone(),
                    emitter: format!("{}_{}", class_name, upper_first(&s.name)),
                })
                .collect(),
            constructor: format!("{}_constructor", host_prefix),
            destroy: format!("{}_destroy", host_prefix),
            slots: schema
                .slots
                .iter()
                .map(|s| SlotSymbol {
                    slot: s.name.clone(),
                    trampoline: format!("{}_slot_{}", host_prefix, s.host_name()),
                })
                .collect(),
            string_free: STRING_FREE_SYMBOL.to_string(),
            class_name,
        }
    }

    /// Accessors of a property
    pub fn property(&self, name: &str) -> Option<&PropertySymbols> {
        self.properties.iter().find(|p| p.property == name)
    }

    /// Emitter of a signal
    pub fn signal(&self, name: &str) -> Option<&SignalSymbol> {
        self.signals.iter().find(|s| s.signal == name)
    }

    /// Trampoline of a slot
    pub fn slot(&self, name: &str) -> Option<&SlotSymbol> {
        self.slots.iter().find(|s| s.slot == name)
    }
}
