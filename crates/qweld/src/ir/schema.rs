//! Validated binding schemas
//!
//! A [`BindingSchema`] is the role-classified description of one type that
//! opted in to qweld. It is only ever produced by the validator (or built by
//! hand in tests), so every member in it is known to be well-formed.

use crate::ir::naming::{to_snake_case, upper_first};
use crate::ir::SemanticType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The role a field plays in a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Property,
    Signal,
    Slot,
    Constructor,
}

impl Role {
    /// Annotation key for this role
    pub const fn key(self) -> &'static str {
        match self {
            Role::Property => "property",
            Role::Signal => "signal",
            Role::Slot => "slot",
            Role::Constructor => "constructor",
        }
    }

    /// Parse an annotation key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "property" => Some(Role::Property),
            "signal" => Some(Role::Signal),
            "slot" => Some(Role::Slot),
            "constructor" => Some(Role::Constructor),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A named, typed value: a property or a parameter/return descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SemanticType,
}

impl Member {
    /// Create a new member
    pub fn new(name: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Name used in generated Rust code
    pub fn host_name(&self) -> String {
        to_snake_case(&self.name)
    }
}

/// An event raised by the native object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Member>,
}

impl Signal {
    /// Create a new signal without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter
    pub fn param(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.params.push(Member::new(name, ty));
        self
    }

    /// Name of the generated host method
    pub fn host_name(&self) -> String {
        to_snake_case(&self.name)
    }
}

/// A callable the native object forwards to the host object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Member>,
    #[serde(default)]
    pub returns: Option<SemanticType>,
}

impl Slot {
    /// Create a new slot without parameters or return value
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// Add a parameter
    pub fn param(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.params.push(Member::new(name, ty));
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: SemanticType) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Name of the host method the slot dispatches to
    pub fn host_name(&self) -> String {
        to_snake_case(&self.name)
    }
}

/// Hook invoked once right after a native instance is registered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constructor {
    pub name: String,
}

impl Constructor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Name of the host method the hook dispatches to
    pub fn host_name(&self) -> String {
        to_snake_case(&self.name)
    }
}

/// Validated description of one bindable type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSchema {
    /// Declared type name
    pub name: String,
    /// Module path of the declaration (e.g. `crate::app::counter`)
    pub module_path: String,
    /// Declaring file, if the schema came from a source tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub properties: Vec<Member>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub constructor: Option<Constructor>,
}

impl BindingSchema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_path: "crate".to_string(),
            source: None,
            properties: Vec::new(),
            signals: Vec::new(),
            slots: Vec::new(),
            constructor: None,
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

    /// Add a property
    pub fn property(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.properties.push(Member::new(name, ty));
        self
    }

    /// Add a signal
    pub fn signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    /// Add a slot
    pub fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    /// Set the constructor hook
    pub fn constructor(mut self, name: impl Into<String>) -> Self {
        self.constructor = Some(Constructor::new(name));
        self
    }

    /// Name of the generated Qt class
    pub fn class_name(&self) -> String {
        upper_first(&self.name)
    }

    /// Name of the change signal for a property (`count` -> `countChanged`)
    pub fn notify_name(property: &Member) -> String {
        format!("{}Changed", property.name)
    }

    /// The declared signal that doubles as a property's change notification
    pub fn notify_signal(&self, property: &Member) -> Option<&Signal> {
        let name = Self::notify_name(property);
        self.signals.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> BindingSchema {
        BindingSchema::new("counter")
            .property("count", SemanticType::Int)
            .signal(Signal::new("countChanged").param("newCount", SemanticType::Int))
            .slot(Slot::new("increment").returns(SemanticType::Int))
            .constructor("init")
    }

    #[test]
    fn test_schema_builder() {
        let schema = counter();
        assert_eq!(schema.class_name(), "Counter");
        assert_eq!(schema.module_path, "crate");
        assert_eq!(schema.properties.len(), 1);
        assert_eq!(schema.slots[0].returns, Some(SemanticType::Int));
        assert_eq!(schema.constructor.as_ref().map(|c| c.name.as_str()), Some("init"));
    }

    #[test]
    fn test_notify_signal() {
        let schema = counter();
        let count = &schema.properties[0];
        assert_eq!(BindingSchema::notify_name(count), "countChanged");
        assert_eq!(schema.notify_signal(count).map(|s| s.params.len()), Some(1));

        let other = BindingSchema::new("Other").property("value", SemanticType::Bool);
        assert!(other.notify_signal(&other.properties[0]).is_none());
    }

    #[test]
    fn test_host_names() {
        let signal = Signal::new("countChanged");
        assert_eq!(signal.host_name(), "count_changed");
        assert_eq!(Member::new("newCount", SemanticType::Int).host_name(), "new_count");
    }

    #[test]
    fn test_schema_serde() {
        let schema = counter();
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("\"type\":\"int\""));
        let back: BindingSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}
