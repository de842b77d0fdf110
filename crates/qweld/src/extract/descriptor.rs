//! Language-neutral binding descriptors
//!
//! A `*.qweld.toml` file declares objects without any Rust source:
//!
//! ```toml
//! [[object]]
//! name = "Counter"
//! module = "crate::counter"
//! constructor = "init"
//!
//! [[object.property]]
//! name = "count"
//! type = "int"
//!
//! [[object.signal]]
//! name = "countChanged"
//! params = [{ name = "newCount", type = "int" }]
//!
//! [[object.slot]]
//! name = "increment"
//! returns = "int"
//! ```
//!
//! Descriptors produce the same raw candidates as annotated structs and go
//! through the same validation.

use crate::extract::ExtractError;
use crate::ir::{FieldShape, RawField, RawParam, Role, SchemaCandidate};
use serde::Deserialize;
use std::path::Path;

/// File name suffix of descriptor files
pub const DESCRIPTOR_SUFFIX: &str = ".qweld.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    #[serde(default)]
    object: Vec<ObjectDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectDescriptor {
    name: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    property: Vec<PropertyDescriptor>,
    #[serde(default)]
    signal: Vec<FunctionDescriptor>,
    #[serde(default)]
    slot: Vec<FunctionDescriptor>,
    /// Either a single constructor name or a list, so duplicates reach the validator
    #[serde(default)]
    constructor: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertyDescriptor {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionDescriptor {
    name: String,
    #[serde(default)]
    params: Vec<ParamDescriptor>,
    #[serde(default)]
    returns: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamDescriptor {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl FunctionDescriptor {
    fn into_field(self, role: Role) -> RawField {
        let shape = FieldShape::Function {
            params: self
                .params
                .into_iter()
                .map(|p| RawParam { name: p.name, ty: p.ty })
                .collect(),
            returns: self.returns.map(OneOrMany::into_vec).unwrap_or_default(),
        };
        RawField::tagged(role, self.name, shape)
    }
}

/// Parse a descriptor file's contents into candidates
///
/// # Errors
/// Returns [`ExtractError::Descriptor`] when the TOML is malformed or does not
/// follow the descriptor layout.
pub fn parse_descriptor(content: &str, path: &Path) -> Result<Vec<SchemaCandidate>, ExtractError> {
    let file: DescriptorFile = toml::from_str(content).map_err(|e| ExtractError::Descriptor {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let candidates = file
        .object
        .into_iter()
        .map(|object| {
            let mut candidate = SchemaCandidate::new(object.name)
                .in_module(object.module.unwrap_or_else(|| "crate".to_string()))
                .with_source(path);

            for property in object.property {
                candidate = candidate.field(RawField::tagged(
                    Role::Property,
                    property.name,
                    FieldShape::Value { ty: property.ty },
                ));
            }
            for signal in object.signal {
                candidate = candidate.field(signal.into_field(Role::Signal));
            }
            for slot in object.slot {
                candidate = candidate.field(slot.into_field(Role::Slot));
            }
            for name in object.constructor.map(OneOrMany::into_vec).unwrap_or_default() {
                candidate = candidate.constructor(&name);
            }

            candidate
        })
        .collect();

    Ok(candidates)
}

/// Whether a path names a descriptor file
pub fn is_descriptor(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(DESCRIPTOR_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use pretty_assertions::assert_eq;

    const COUNTER: &str = r#"
[[object]]
name = "Counter"
constructor = "init"

[[object.property]]
name = "count"
type = "int"

[[object.signal]]
name = "countChanged"
params = [{ name = "newCount", type = "int" }]

[[object.slot]]
name = "increment"
returns = "int"
"#;

    #[test]
    fn test_descriptor_matches_builder() {
        let path = Path::new("ui/counter.qweld.toml");
        let candidates = parse_descriptor(COUNTER, path).unwrap();

        let expected = SchemaCandidate::new("Counter")
            .with_source(path)
            .property("count", "int")
            .signal("countChanged", &[("newCount", "int")])
            .slot("increment", &[], &["int"])
            .constructor("init");

        assert_eq!(candidates, vec![expected]);
        let (_, errors) = validate(&candidates[0]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_multiple_returns_and_unnamed_params() {
        let content = r#"
[[object]]
name = "Calc"
module = "crate::calc"

[[object.slot]]
name = "divmod"
params = [{ type = "int" }, { type = "int" }]
returns = ["int", "int"]
"#;
        let candidates = parse_descriptor(content, Path::new("calc.qweld.toml")).unwrap();
        assert_eq!(candidates[0].module_path, "crate::calc");
        assert_eq!(
            candidates[0].fields[0].shape,
            FieldShape::Function {
                params: vec![RawParam::new(None, "int"), RawParam::new(None, "int")],
                returns: vec!["int".into(), "int".into()],
            }
        );
    }

    #[test]
    fn test_malformed_descriptor() {
        let err = parse_descriptor("[[object]]\nnam = \"x\"", Path::new("bad.qweld.toml")).unwrap_err();
        assert!(matches!(err, ExtractError::Descriptor { .. }));
    }

    #[test]
    fn test_is_descriptor() {
        assert!(is_descriptor(Path::new("a/counter.qweld.toml")));
        assert!(!is_descriptor(Path::new("a/Cargo.toml")));
        assert!(!is_descriptor(Path::new("a/counter.rs")));
    }
}
