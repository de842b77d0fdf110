//! Raw schema candidates
//!
//! The extractor only classifies structure: which fields carry which role
//! tags and what shape their type has. Everything else (names, types,
//! duplicates) is left for the validator, so a candidate may describe a
//! completely invalid binding.

use crate::ir::Role;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A `role = "name"` pair found on a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleTag {
    pub role: Role,
    pub name: String,
}

impl RoleTag {
    pub fn new(role: Role, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
        }
    }
}

/// A function parameter as written in the declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawParam {
    /// Parameter name, if one was written
    pub name: Option<String>,
    /// Type as written
    #[serde(rename = "type")]
    pub ty: String,
}

impl RawParam {
    pub fn new(name: Option<&str>, ty: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            ty: ty.into(),
        }
    }
}

/// Structural shape of a tagged field's type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum FieldShape {
    /// A directly typed field (`_count: i32`)
    Value {
        #[serde(rename = "type")]
        ty: String,
    },
    /// A function-shaped field (`_increment: fn() -> i32`)
    Function {
        params: Vec<RawParam>,
        returns: Vec<String>,
    },
    /// Anything else (references, tuples, arrays, ...)
    Other {
        #[serde(rename = "type")]
        ty: String,
    },
}

/// One annotated field of a candidate type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    /// Field identifier as declared (`_count`)
    pub label: String,
    /// Whether the field is an anonymous placeholder
    pub placeholder: bool,
    /// Role tags in declaration order
    pub tags: Vec<RoleTag>,
    pub shape: FieldShape,
    /// Line of the declaration, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl RawField {
    /// Create a placeholder field with a single role tag
    pub fn tagged(role: Role, name: impl Into<String>, shape: FieldShape) -> Self {
        let name = name.into();
        Self {
            label: format!("_{}", name),
            placeholder: true,
            tags: vec![RoleTag::new(role, name)],
            shape,
            line: None,
        }
    }

    /// Set the field label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self.placeholder = self.label.starts_with('_');
        self
    }

    /// Add another role tag
    pub fn with_tag(mut self, role: Role, name: impl Into<String>) -> Self {
        self.tags.push(RoleTag::new(role, name));
        self
    }

    /// Set the declaration line
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// A type declaration that opted in to bindings, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCandidate {
    /// Declared type name
    pub name: String,
    /// Module path of the declaration
    pub module_path: String,
    /// Declaring file, when extracted from a tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Line of the declaration, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Tagged fields in declaration order
    pub fields: Vec<RawField>,
}

impl SchemaCandidate {
    /// Create a candidate with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_path: "crate".to_string(),
            source: None,
            line: None,
            fields: Vec::new(),
        }
    }

    /// Set the module path
    pub fn in_module(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    /// Set the declaring file
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a raw field
    pub fn field(mut self, field: RawField) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a property field
    pub fn property(self, name: &str, ty: &str) -> Self {
        self.field(RawField::tagged(
            Role::Property,
            name,
            FieldShape::Value { ty: ty.to_string() },
        ))
    }

    /// Add a signal field with named parameters
    pub fn signal(self, name: &str, params: &[(&str, &str)]) -> Self {
        self.field(RawField::tagged(Role::Signal, name, fn_shape(params, &[])))
    }

    /// Add a slot field with named parameters and return types
    pub fn slot(self, name: &str, params: &[(&str, &str)], returns: &[&str]) -> Self {
        self.field(RawField::tagged(Role::Slot, name, fn_shape(params, returns)))
    }

    /// Add a constructor field
    pub fn constructor(self, name: &str) -> Self {
        self.field(RawField::tagged(Role::Constructor, name, fn_shape(&[], &[])))
    }
}

/// Build a function shape from `(name, type)` pairs and return types
pub fn fn_shape(params: &[(&str, &str)], returns: &[&str]) -> FieldShape {
    FieldShape::Function {
        params: params
            .iter()
            .map(|(name, ty)| RawParam::new(Some(*name), *ty))
            .collect(),
        returns: returns.iter().map(|r| r.to_string()).collect(),
    }
}
