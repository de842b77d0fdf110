//! Schema validation
//!
//! Turns a [`SchemaCandidate`] into a [`BindingSchema`], collecting every
//! problem instead of stopping at the first one so that users can fix a whole
//! batch in one go. A field that fails any rule is left out of the schema;
//! for duplicated names the first declaration wins.

use crate::ir::naming::{check_identifier, file_stem, is_internal_name, to_snake_case, upper_first};
use crate::ir::{
    BindingSchema, Constructor, FieldShape, Member, RawField, RawParam, Role, RoleTag,
    SchemaCandidate, SemanticType, Signal, Slot, UnknownType,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where a validation error was found
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
    /// Label of the offending field, if the error belongs to one
    pub field: Option<String>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, "{}:{}: ", path.display(), line),
            (Some(path), None) => write!(f, "{}: ", path.display()),
            (None, Some(line)) => write!(f, "line {}: ", line),
            (None, None) => Ok(()),
        }
    }
}

/// The rule a validation error violates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    /// Field tagged with more than one role
    #[error("a field must be used for exactly one purpose (tagged as {})", join_roles(.roles))]
    MultipleRoles { roles: Vec<Role> },

    /// Field shape does not match its role
    #[error("{reason}")]
    ShapeMismatch { reason: String },

    /// Name already used by an earlier member
    #[error("name has been declared before as a {previous}")]
    DuplicateName { previous: Role },

    /// Second constructor in one schema
    #[error("other constructor {previous} has been declared before")]
    DuplicateConstructor { previous: String },

    /// Type missing from the mapping table
    #[error("{0}")]
    UnknownType(#[from] UnknownType),

    /// Member or parameter name breaks the identifier rule
    #[error("{reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// Declared `<property>Changed` signal cannot notify the property
    #[error("signal notifies property {property} and must take exactly one {expected} parameter")]
    NotifyConflict {
        property: String,
        expected: SemanticType,
    },

    /// Two members generate the same code name
    #[error("generated name {generated} of {second} collides with {first}")]
    NameCollision {
        generated: String,
        first: String,
        second: String,
    },

    /// Type name declared twice in one run
    #[error("type has been declared before{}", .previous.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    DuplicateObject { previous: Option<PathBuf> },

    /// Two types of one run map to the same output files or symbols
    #[error("generated {generated} collides with type {other}{}", .previous.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    ObjectCollision {
        generated: String,
        other: String,
        previous: Option<PathBuf>,
    },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single validation failure with its context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the schema being validated
    pub object: String,
    /// The member the error belongs to, if any
    pub member: Option<RoleTag>,
    pub location: Location,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}object {}", self.location, self.object)?;
        if let Some(member) = &self.member {
            write!(f, ", {} {}", member.role, member.name)?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for ValidationError {}

/// Validate one candidate
///
/// Returns the schema made of every member that passed all rules, together
/// with the errors found. A well-formed candidate yields an empty list.
pub fn validate(candidate: &SchemaCandidate) -> (BindingSchema, Vec<ValidationError>) {
    let mut validator = Validator::new(candidate);

    for field in &candidate.fields {
        validator.check_field(field);
    }

    validator.check_notifiers();
    validator.check_collisions();

    (validator.schema, validator.errors)
}

/// Validate every candidate of a run
///
/// # Errors
/// Returns all errors of all candidates if any candidate is invalid. No
/// schema is returned in that case, so nothing gets emitted.
pub fn validate_all(candidates: &[SchemaCandidate]) -> Result<Vec<BindingSchema>, Vec<ValidationError>> {
    let mut schemas = Vec::with_capacity(candidates.len());
    let mut errors = Vec::new();
    let mut seen: HashMap<String, Option<PathBuf>> = HashMap::new();
    // File stems and symbol prefixes fold case, so distinct class names can
    // still share them (`HtmlView` and `HTMLView`)
    let mut stems: HashMap<String, &SchemaCandidate> = HashMap::new();
    let mut prefixes: HashMap<String, &SchemaCandidate> = HashMap::new();

    for candidate in candidates {
        let location = Location {
            path: candidate.source.clone(),
            line: candidate.line,
            field: None,
        };
        let duplicate = |kind| ValidationError {
            object: candidate.name.clone(),
            member: None,
            location: location.clone(),
            kind,
        };

        let class_name = upper_first(&candidate.name);
        if let Some(previous) = seen.get(&class_name) {
            errors.push(duplicate(ValidationErrorKind::DuplicateObject {
                previous: previous.clone(),
            }));
            continue;
        }

        let stem = file_stem(&candidate.name);
        let prefix = to_snake_case(&candidate.name);
        let collision = match (stems.get(&stem), prefixes.get(&prefix)) {
            (Some(other), _) => Some((format!("file stem {}", stem), *other)),
            (None, Some(other)) => Some((format!("symbol prefix {}", prefix), *other)),
            (None, None) => None,
        };
        if let Some((generated, other)) = collision {
            errors.push(duplicate(ValidationErrorKind::ObjectCollision {
                generated,
                other: other.name.clone(),
                previous: other.source.clone(),
            }));
            continue;
        }

        seen.insert(class_name, candidate.source.clone());
        stems.insert(stem, candidate);
        prefixes.insert(prefix, candidate);

        let (schema, schema_errors) = validate(candidate);
        if schema_errors.is_empty() {
            schemas.push(schema);
        } else {
            errors.extend(schema_errors);
        }
    }

    if errors.is_empty() {
        Ok(schemas)
    } else {
        tracing::debug!(count = errors.len(), "validation rejected the batch");
        Err(errors)
    }
}

/// A member that passed its role's shape and type rules
enum Accepted {
    Property(Member),
    Constructor(Constructor),
    Signal(Signal),
    Slot(Slot),
}

struct Validator<'a> {
    candidate: &'a SchemaCandidate,
    schema: BindingSchema,
    errors: Vec<ValidationError>,
    /// Declared member names and the role that claimed them first
    names: HashMap<String, Role>,
    /// Tags of accepted members, for error context in later passes
    accepted: Vec<(RoleTag, Option<&'a RawField>)>,
}

impl<'a> Validator<'a> {
    fn new(candidate: &'a SchemaCandidate) -> Self {
        let mut schema = BindingSchema::new(candidate.name.clone()).in_module(candidate.module_path.clone());
        schema.source = candidate.source.clone();

        Self {
            candidate,
            schema,
            errors: Vec::new(),
            names: HashMap::new(),
            accepted: Vec::new(),
        }
    }

    fn error(&mut self, tag: Option<&RoleTag>, field: Option<&RawField>, kind: ValidationErrorKind) {
        self.errors.push(ValidationError {
            object: self.candidate.name.clone(),
            member: tag.cloned(),
            location: Location {
                path: self.candidate.source.clone(),
                line: field.and_then(|f| f.line).or(self.candidate.line),
                field: field.map(|f| f.label.clone()),
            },
            kind,
        });
    }

    fn mismatch(&mut self, tag: &RoleTag, field: &RawField, reason: impl Into<String>) {
        self.error(
            Some(tag),
            Some(field),
            ValidationErrorKind::ShapeMismatch {
                reason: reason.into(),
            },
        );
    }

    /// Check one field against every rule, reporting each violation
    fn check_field(&mut self, field: &'a RawField) {
        let Some(tag) = field.tags.first() else {
            return;
        };

        if field.tags.len() > 1 {
            let roles = field.tags.iter().map(|t| t.role).collect();
            self.error(Some(tag), Some(field), ValidationErrorKind::MultipleRoles { roles });
            return;
        }

        let mut ok = true;

        if !field.placeholder {
            self.mismatch(
                tag,
                field,
                format!(
                    "must be an anonymous placeholder field (rename `{}` to start with `_`)",
                    field.label
                ),
            );
            ok = false;
        }

        if let Err(reason) = check_identifier(&tag.name) {
            self.error(
                Some(tag),
                Some(field),
                ValidationErrorKind::InvalidIdentifier {
                    name: tag.name.clone(),
                    reason: reason.to_string(),
                },
            );
            ok = false;
        }

        if tag.role == Role::Constructor {
            if let Some(previous) = &self.schema.constructor {
                let previous = previous.name.clone();
                self.error(Some(tag), Some(field), ValidationErrorKind::DuplicateConstructor { previous });
                ok = false;
            }
        }

        if let Some(previous) = self.names.get(&tag.name).copied() {
            self.error(Some(tag), Some(field), ValidationErrorKind::DuplicateName { previous });
            ok = false;
        }

        let member = match tag.role {
            Role::Property => self.check_property(tag, field).map(Accepted::Property),
            Role::Constructor => self.check_constructor(tag, field).map(Accepted::Constructor),
            Role::Signal => self.check_signal(tag, field).map(Accepted::Signal),
            Role::Slot => self.check_slot(tag, field).map(Accepted::Slot),
        };

        let (Some(member), true) = (member, ok) else {
            return;
        };

        match member {
            Accepted::Property(m) => self.schema.properties.push(m),
            Accepted::Constructor(c) => self.schema.constructor = Some(c),
            Accepted::Signal(s) => self.schema.signals.push(s),
            Accepted::Slot(s) => self.schema.slots.push(s),
        }
        self.names.insert(tag.name.clone(), tag.role);
        self.accepted.push((tag.clone(), Some(field)));
    }

    fn check_property(&mut self, tag: &RoleTag, field: &RawField) -> Option<Member> {
        match &field.shape {
            FieldShape::Value { ty } => match ty.parse::<SemanticType>() {
                Ok(ty) => Some(Member::new(tag.name.clone(), ty)),
                Err(err) => {
                    self.error(Some(tag), Some(field), err.into());
                    None
                }
            },
            FieldShape::Function { .. } => {
                self.mismatch(tag, field, "property must be a primitive-typed field, not a function");
                None
            }
            FieldShape::Other { ty } => {
                self.mismatch(tag, field, format!("property must be a primitive-typed field, found {}", ty));
                None
            }
        }
    }

    fn check_constructor(&mut self, tag: &RoleTag, field: &RawField) -> Option<Constructor> {
        let FieldShape::Function { params, returns } = &field.shape else {
            self.mismatch(tag, field, "constructor must be a function-shaped field");
            return None;
        };

        let mut ok = true;
        if !returns.is_empty() {
            self.mismatch(tag, field, "must not have return value");
            ok = false;
        }

        if !params.is_empty() {
            self.mismatch(tag, field, "must not have any parameter");
            ok = false;
        }

        ok.then(|| Constructor::new(tag.name.clone()))
    }

    fn check_signal(&mut self, tag: &RoleTag, field: &RawField) -> Option<Signal> {
        let FieldShape::Function { params, returns } = &field.shape else {
            self.mismatch(tag, field, "signal must be a function-shaped field");
            return None;
        };

        let mut ok = true;
        if !returns.is_empty() {
            self.mismatch(tag, field, "must not have return value");
            ok = false;
        }

        let params = self.check_params(tag, field, params)?;
        ok.then(|| Signal {
            name: tag.name.clone(),
            params,
        })
    }

    fn check_slot(&mut self, tag: &RoleTag, field: &RawField) -> Option<Slot> {
        let FieldShape::Function { params, returns } = &field.shape else {
            self.mismatch(tag, field, "slot must be a function-shaped field");
            return None;
        };

        let mut ok = true;
        let mut return_type = None;
        if returns.len() > 1 {
            self.mismatch(tag, field, "only one return value allowed");
            ok = false;
        } else if let Some(ty) = returns.first() {
            match ty.parse::<SemanticType>() {
                Ok(ty) => return_type = Some(ty),
                Err(err) => {
                    self.error(Some(tag), Some(field), err.into());
                    ok = false;
                }
            }
        }

        let params = self.check_params(tag, field, params)?;
        ok.then(|| Slot {
            name: tag.name.clone(),
            params,
            returns: return_type,
        })
    }

    /// Resolve parameter names and types, reporting every bad parameter
    fn check_params(&mut self, tag: &RoleTag, field: &RawField, params: &[RawParam]) -> Option<Vec<Member>> {
        let mut members = Vec::with_capacity(params.len());
        let mut seen = BTreeSet::new();
        let mut ok = true;

        for (i, param) in params.iter().enumerate() {
            let name = param.name.clone().unwrap_or_else(|| format!("p{}", i));

            let reason = match check_identifier(&name) {
                Err(reason) => Some(format!("parameter {}: {}", name, reason)),
                Ok(()) if is_internal_name(&name) => {
                    Some(format!("parameter {}: name is reserved for generated code", name))
                }
                Ok(()) if !seen.insert(to_snake_case(&name)) => {
                    Some(format!("parameter {} is declared more than once", name))
                }
                Ok(()) => None,
            };

            if let Some(reason) = reason {
                self.error(
                    Some(tag),
                    Some(field),
                    ValidationErrorKind::InvalidIdentifier { name, reason },
                );
                ok = false;
                continue;
            }

            match param.ty.parse::<SemanticType>() {
                Ok(ty) => members.push(Member::new(name, ty)),
                Err(err) => {
                    self.error(Some(tag), Some(field), err.into());
                    ok = false;
                }
            }
        }

        ok.then_some(members)
    }

    fn field_for(&self, role: Role, name: &str) -> (RoleTag, Option<&'a RawField>) {
        self.accepted
            .iter()
            .find(|(tag, _)| tag.role == role && tag.name == name)
            .cloned()
            .unwrap_or_else(|| (RoleTag::new(role, name), None))
    }

    /// A declared `<property>Changed` signal must fit the property's setter
    fn check_notifiers(&mut self) {
        let mut conflicts = Vec::new();

        for property in &self.schema.properties {
            let Some(signal) = self.schema.notify_signal(property) else {
                continue;
            };

            let fits = signal.params.len() == 1 && signal.params[0].ty == property.ty;
            if !fits {
                conflicts.push((signal.name.clone(), property.name.clone(), property.ty));
            }
        }

        for (signal, property, expected) in conflicts {
            let (tag, field) = self.field_for(Role::Signal, &signal);
            self.error(
                Some(&tag),
                field,
                ValidationErrorKind::NotifyConflict { property, expected },
            );
        }
    }

    /// Generated C++ and Rust member names must be unique
    fn check_collisions(&mut self) {
        let mut native: Vec<(String, Role, String, String)> = Vec::new();
        let mut host: Vec<(String, Role, String, String)> = Vec::new();
        // Suffixes of the `<Class>_` C accessor symbols
        let mut accessors: Vec<(String, Role, String, String)> = Vec::new();

        for p in &self.schema.properties {
            let upper = upper_first(&p.name);
            native.push((p.name.clone(), Role::Property, p.name.clone(), format!("getter of property {}", p.name)));
            native.push((format!("set{}", upper), Role::Property, p.name.clone(), format!("setter of property {}", p.name)));
            accessors.push((upper.clone(), Role::Property, p.name.clone(), format!("getter of property {}", p.name)));
            accessors.push((format!("Set{}", upper), Role::Property, p.name.clone(), format!("setter of property {}", p.name)));
            if self.schema.notify_signal(p).is_none() {
                native.push((
                    BindingSchema::notify_name(p),
                    Role::Property,
                    p.name.clone(),
                    format!("change signal of property {}", p.name),
                ));
            }

            host.push((p.host_name(), Role::Property, p.name.clone(), format!("getter of property {}", p.name)));
            host.push((format!("set_{}", p.host_name()), Role::Property, p.name.clone(), format!("setter of property {}", p.name)));
        }

        for s in &self.schema.signals {
            native.push((s.name.clone(), Role::Signal, s.name.clone(), format!("signal {}", s.name)));
            accessors.push((upper_first(&s.name), Role::Signal, s.name.clone(), format!("emitter of signal {}", s.name)));
            host.push((s.host_name(), Role::Signal, s.name.clone(), format!("signal {}", s.name)));
        }

        for s in &self.schema.slots {
            native.push((s.name.clone(), Role::Slot, s.name.clone(), format!("slot {}", s.name)));
            host.push((s.host_name(), Role::Slot, s.name.clone(), format!("slot {}", s.name)));
        }

        if let Some(c) = &self.schema.constructor {
            host.push((c.host_name(), Role::Constructor, c.name.clone(), format!("constructor {}", c.name)));
        }

        let mut reported = BTreeSet::new();
        for (names, reserved) in [(native, None), (host, Some("register_as")), (accessors, Some("RegisterType"))] {
            let mut taken: BTreeMap<String, String> = BTreeMap::new();
            if let Some(reserved) = reserved {
                taken.insert(reserved.to_string(), "the registration helper".to_string());
            }

            for (generated, role, member, origin) in names {
                match taken.get(&generated) {
                    Some(first) => {
                        if !reported.insert((first.clone(), origin.clone())) {
                            continue;
                        }
                        let first = first.clone();
                        let (tag, field) = self.field_for(role, &member);
                        self.error(
                            Some(&tag),
                            field,
                            ValidationErrorKind::NameCollision {
                                generated,
                                first,
                                second: origin,
                            },
                        );
                    }
                    None => {
                        taken.insert(generated, origin);
                    }
                }
            }
        }
    }
}
