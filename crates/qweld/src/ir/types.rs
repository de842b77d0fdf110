//! Type system for qweld
//!
//! This module maps the small set of primitive semantic types a binding may
//! use onto their spelling in each of the three generated contexts.
//!
//! # Type Mapping Overview
//!
//! | Semantic | Rust host | Qt class (`nativeRepr`) | C ABI shim (`shimRepr`) | Rust FFI (`hostRepr`) |
//! |----------|-----------|-------------------------|-------------------------|-----------------------|
//! | `int` | `isize` | `int` | `int` | `c_int` |
//! | `int32` | `i32` | `int` | `int` | `c_int` |
//! | `int64` | `i64` | `qint64` | `int64_t` | `i64` |
//! | `float32` | `f32` | `float` | `float` | `c_float` |
//! | `float64` | `f64` | `double` | `double` | `c_double` |
//! | `bool` | `bool` | `bool` | `bool` | `bool` |
//! | `string` | `String` | `QString` | `char*` | `*mut c_char` |
//!
//! `int` and `int32` share a C representation but stay distinct semantic
//! types: `int` is the platform-sized Rust integer and is truncated to 32 bits
//! when it crosses the boundary.
//!
//! # Ownership
//!
//! Every type except `string` crosses the boundary by value. A `string` shim
//! value is a heap buffer; the side that allocated it is the side that frees
//! it. See [`Ownership`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a type name has no entry in the mapping table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type {0}")]
pub struct UnknownType(pub String);

/// Primitive semantic types supported across the native/host boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Platform integer, 32 bits on the wire
    Int,
    /// Explicit 32-bit integer
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    /// UTF-8 string
    String,
}

/// How a shim value is owned while crossing the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Plain value, copied
    Value,
    /// Heap buffer released by whichever side allocated it
    HeapBuffer,
}

/// Representations of one semantic type in every generated context
#[derive(Debug)]
pub struct TypeMapping {
    /// The semantic type this entry describes
    pub semantic: SemanticType,
    /// Rust type used by host objects
    pub host_type: &'static str,
    /// Type used inside the Qt class
    pub native_repr: &'static str,
    /// Type used in the C ABI header
    pub shim_repr: &'static str,
    /// Type used for the shim value in Rust `extern "C"` signatures
    pub host_repr: &'static str,
    /// Zero shim value returned by trampolines that must no-op
    pub shim_zero: &'static str,
    /// Ownership of the shim value
    pub ownership: Ownership,
}

const INT: TypeMapping = TypeMapping {
    semantic: SemanticType::Int,
    host_type: "isize",
    native_repr: "int",
    shim_repr: "int",
    host_repr: "::std::ffi::c_int",
    shim_zero: "0",
    ownership: Ownership::Value,
};

const INT32: TypeMapping = TypeMapping {
    semantic: SemanticType::Int32,
    host_type: "i32",
    native_repr: "int",
    shim_repr: "int",
    host_repr: "::std::ffi::c_int",
    shim_zero: "0",
    ownership: Ownership::Value,
};

const INT64: TypeMapping = TypeMapping {
    semantic: SemanticType::Int64,
    host_type: "i64",
    native_repr: "qint64",
    shim_repr: "int64_t",
    host_repr: "i64",
    shim_zero: "0",
    ownership: Ownership::Value,
};

const FLOAT32: TypeMapping = TypeMapping {
    semantic: SemanticType::Float32,
    host_type: "f32",
    native_repr: "float",
    shim_repr: "float",
    host_repr: "::std::ffi::c_float",
    shim_zero: "0.0",
    ownership: Ownership::Value,
};

const FLOAT64: TypeMapping = TypeMapping {
    semantic: SemanticType::Float64,
    host_type: "f64",
    native_repr: "double",
    shim_repr: "double",
    host_repr: "::std::ffi::c_double",
    shim_zero: "0.0",
    ownership: Ownership::Value,
};

const BOOL: TypeMapping = TypeMapping {
    semantic: SemanticType::Bool,
    host_type: "bool",
    native_repr: "bool",
    shim_repr: "bool",
    host_repr: "bool",
    shim_zero: "false",
    ownership: Ownership::Value,
};

const STRING: TypeMapping = TypeMapping {
    semantic: SemanticType::String,
    host_type: "String",
    native_repr: "QString",
    shim_repr: "char*",
    host_repr: "*mut ::std::ffi::c_char",
    shim_zero: "::std::ptr::null_mut()",
    ownership: Ownership::HeapBuffer,
};

impl SemanticType {
    /// Every supported type, in table order
    pub const ALL: [SemanticType; 7] = [
        SemanticType::Int,
        SemanticType::Int32,
        SemanticType::Int64,
        SemanticType::Float32,
        SemanticType::Float64,
        SemanticType::Bool,
        SemanticType::String,
    ];

    /// Get the mapping entry for this type
    pub const fn mapping(self) -> &'static TypeMapping {
        match self {
            SemanticType::Int => &INT,
            SemanticType::Int32 => &INT32,
            SemanticType::Int64 => &INT64,
            SemanticType::Float32 => &FLOAT32,
            SemanticType::Float64 => &FLOAT64,
            SemanticType::Bool => &BOOL,
            SemanticType::String => &STRING,
        }
    }

    /// Canonical semantic name (`int`, `int32`, ..., `string`)
    pub const fn name(self) -> &'static str {
        match self {
            SemanticType::Int => "int",
            SemanticType::Int32 => "int32",
            SemanticType::Int64 => "int64",
            SemanticType::Float32 => "float32",
            SemanticType::Float64 => "float64",
            SemanticType::Bool => "bool",
            SemanticType::String => "string",
        }
    }

    /// Parse either the semantic name or the Rust spelling of a type
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "int" | "isize" => Some(SemanticType::Int),
            "int32" | "i32" => Some(SemanticType::Int32),
            "int64" | "i64" => Some(SemanticType::Int64),
            "float32" | "f32" => Some(SemanticType::Float32),
            "float64" | "f64" => Some(SemanticType::Float64),
            "bool" => Some(SemanticType::Bool),
            "string" | "String" => Some(SemanticType::String),
            _ => None,
        }
    }

    /// Whether values of this type are heap buffers at the boundary
    pub fn is_heap_buffer(self) -> bool {
        self.mapping().ownership == Ownership::HeapBuffer
    }
}

impl FromStr for SemanticType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticType::parse(s).ok_or_else(|| UnknownType(s.trim().to_string()))
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TypeMapping {
    /// Look up the mapping for a type name
    ///
    /// # Errors
    /// Returns [`UnknownType`] if the name has no entry in the table.
    pub fn resolve(name: &str) -> Result<&'static TypeMapping, UnknownType> {
        name.parse::<SemanticType>().map(SemanticType::mapping)
    }

    /// Rust expression converting a shim value into the host representation
    ///
    /// `runtime` is the path of the runtime crate (`::qweld_runtime`). The
    /// expression borrows `expr` and never frees it.
    pub fn shim_to_host(&self, runtime: &str, expr: &str) -> String {
        format!(
            "unsafe {{ <{} as {}::Marshal>::from_shim({}) }}",
            self.host_type, runtime, expr
        )
    }

    /// Rust expression converting a host value into its shim representation
    ///
    /// For heap buffers the result is owned by the receiver, which must
    /// release it with `qweld_string_free`.
    pub fn host_to_shim(&self, runtime: &str, expr: &str) -> String {
        format!("<{} as {}::Marshal>::to_shim(&{})", self.host_type, runtime, expr)
    }

    /// C++ expression converting a shim value into the Qt representation
    pub fn shim_to_native(&self, expr: &str) -> String {
        match self.ownership {
            Ownership::Value => expr.to_string(),
            Ownership::HeapBuffer => format!("QString::fromUtf8({})", expr),
        }
    }

    /// C++ expression converting a Qt value into a `malloc`ed shim buffer
    /// or a plain value
    pub fn native_to_shim(&self, expr: &str) -> String {
        match self.ownership {
            Ownership::Value => expr.to_string(),
            Ownership::HeapBuffer => format!("strdup({}.toUtf8().constData())", expr),
        }
    }
}
