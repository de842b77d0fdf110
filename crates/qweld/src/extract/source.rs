//! Rust source extraction
//!
//! Parses a Rust file with `syn`, finds every struct that embeds the marker
//! base type and turns its `#[qweld(..)]` fields into a [`SchemaCandidate`].

use crate::extract::cfg::CfgSet;
use crate::extract::{ExtractError, ExtractOptions, Extraction};
use crate::ir::{FieldShape, RawField, RawParam, Role, RoleTag, SchemaCandidate};
use quote::ToTokens;
use std::collections::HashMap;
use std::path::{Component, Path};
use syn::spanned::Spanned;
use syn::{Attribute, Field, Fields, GenericArgument, Item, ItemStruct, LitStr, PathArguments, ReturnType, Type, UseTree};

/// Name of the marker base type
pub const MARKER_TYPE: &str = "QmlObject";

/// Extract candidates from one Rust source text
pub fn extract_source(source: &str, path: &Path, module_path: &str, options: &ExtractOptions) -> Extraction {
    let mut extraction = Extraction::default();

    let file = match syn::parse_file(source) {
        Ok(file) => file,
        Err(err) => {
            let start = err.span().start();
            extraction.errors.push(ExtractError::Parse {
                path: path.to_path_buf(),
                line: start.line,
                column: start.column + 1,
                message: err.to_string(),
            });
            return extraction;
        }
    };

    if !options.cfg.is_enabled(&file.attrs) {
        tracing::debug!(path = %path.display(), "file disabled by cfg");
        return extraction;
    }

    let mut scanner = Scanner {
        path,
        options,
        extraction: &mut extraction,
    };
    scanner.scan_items(&file.items, module_path);

    extraction
}

struct Scanner<'a> {
    path: &'a Path,
    options: &'a ExtractOptions,
    extraction: &'a mut Extraction,
}

impl Scanner<'_> {
    fn scan_items(&mut self, items: &[Item], module_path: &str) {
        let options = self.options;
        let scope = Scope::collect(items, &options.cfg);
        let is_marker = |path: &syn::Path| scope.is_marker(path, &options.runtime_crate);

        for item in items {
            match item {
                Item::Struct(item) if options.cfg.is_enabled(&item.attrs) => {
                    match candidate_from_struct(item, Some(&options.cfg), &is_marker) {
                        Ok(Some(candidate)) => {
                            tracing::debug!(
                                name = %candidate.name,
                                module = module_path,
                                "found binding candidate"
                            );
                            self.extraction
                                .candidates
                                .push(candidate.in_module(module_path).with_source(self.path));
                        }
                        Ok(None) => {}
                        Err(err) => {
                            self.extraction.errors.push(ExtractError::Annotation {
                                path: self.path.to_path_buf(),
                                line: err.span().start().line,
                                message: err.to_string(),
                            });
                        }
                    }
                }
                Item::Mod(module) if options.cfg.is_enabled(&module.attrs) => {
                    if let Some((_, content)) = &module.content {
                        let nested = format!("{}::{}", module_path, module.ident);
                        self.scan_items(content, &nested);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Imports visible in one module
#[derive(Debug, Default)]
struct Scope {
    /// Local name -> full path
    aliases: HashMap<String, Vec<String>>,
    /// Prefixes imported with `*`
    globs: Vec<Vec<String>>,
}

impl Scope {
    fn collect(items: &[Item], cfg: &CfgSet) -> Self {
        let mut scope = Self::default();

        for item in items {
            match item {
                Item::Use(item) if cfg.is_enabled(&item.attrs) => {
                    scope.add_use(&mut Vec::new(), &item.tree);
                }
                Item::ExternCrate(item) if cfg.is_enabled(&item.attrs) => {
                    if let Some((_, rename)) = &item.rename {
                        scope
                            .aliases
                            .insert(rename.to_string(), vec![item.ident.to_string()]);
                    }
                }
                _ => {}
            }
        }

        scope
    }

    fn add_use(&mut self, prefix: &mut Vec<String>, tree: &UseTree) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.add_use(prefix, &path.tree);
                prefix.pop();
            }
            UseTree::Name(name) => {
                if name.ident == "self" {
                    if let Some(last) = prefix.last() {
                        self.aliases.insert(last.clone(), prefix.clone());
                    }
                } else {
                    let mut full = prefix.clone();
                    full.push(name.ident.to_string());
                    self.aliases.insert(name.ident.to_string(), full);
                }
            }
            UseTree::Rename(rename) => {
                if rename.rename == "_" {
                    return;
                }
                let mut full = prefix.clone();
                if rename.ident != "self" {
                    full.push(rename.ident.to_string());
                }
                self.aliases.insert(rename.rename.to_string(), full);
            }
            UseTree::Glob(_) => self.globs.push(prefix.clone()),
            UseTree::Group(group) => {
                for tree in &group.items {
                    self.add_use(prefix, tree);
                }
            }
        }
    }

    /// Expand the first segment of a path through the module's imports
    fn resolve(&self, path: &syn::Path) -> Vec<String> {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();

        if path.leading_colon.is_some() {
            return segments;
        }

        if let Some(full) = segments.first().and_then(|first| self.aliases.get(first)) {
            return full.iter().chain(&segments[1..]).cloned().collect();
        }

        segments
    }

    /// Whether a type path names the runtime's marker base type
    fn is_marker(&self, path: &syn::Path, runtime_crate: &str) -> bool {
        let full = self.resolve(path);

        if full.len() >= 2 && full[0] == runtime_crate && full.last().is_some_and(|s| s == MARKER_TYPE) {
            return true;
        }

        // Unresolved single name, possibly brought in by a glob import
        full.len() == 1
            && full[0] == MARKER_TYPE
            && !self.aliases.contains_key(MARKER_TYPE)
            && self.globs.iter().any(|g| g.first().is_some_and(|c| c == runtime_crate))
    }
}

/// Build a candidate from a struct declaration
///
/// Returns `Ok(None)` when the struct does not embed the marker base type.
/// Fields disabled by `cfg` are skipped when a filter is given. The
/// `is_marker` predicate decides whether a field type is the marker; a field
/// annotated with `#[qweld(base)]` always is.
///
/// # Errors
/// Returns the first malformed `#[qweld(..)]` attribute.
pub fn candidate_from_struct(
    item: &ItemStruct,
    cfg: Option<&CfgSet>,
    is_marker: &dyn Fn(&syn::Path) -> bool,
) -> syn::Result<Option<SchemaCandidate>> {
    let fields: Vec<&Field> = match &item.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unnamed(unnamed) => unnamed.unnamed.iter().collect(),
        Fields::Unit => return Ok(None),
    };

    let mut has_base = false;
    let mut raw_fields = Vec::new();

    for (index, field) in fields.into_iter().enumerate() {
        if cfg.is_some_and(|cfg| !cfg.is_enabled(&field.attrs)) {
            continue;
        }

        let annotation = parse_annotations(&field.attrs)?;
        if annotation.base || is_marker_field(field, is_marker) {
            has_base = true;
        }

        if annotation.tags.is_empty() {
            continue;
        }

        let label = field
            .ident
            .as_ref()
            .map(|ident| ident.to_string())
            .unwrap_or_else(|| index.to_string());

        raw_fields.push(RawField {
            placeholder: label.starts_with('_'),
            label,
            tags: annotation.tags,
            shape: field_shape(&field.ty),
            line: line_of(field.ident.as_ref().map(|i| i.span()).unwrap_or_else(|| field.ty.span())),
        });
    }

    if !has_base {
        if !raw_fields.is_empty() {
            tracing::debug!(name = %item.ident, "struct has qweld fields but no marker base");
        }
        return Ok(None);
    }

    let mut candidate = SchemaCandidate::new(item.ident.to_string());
    candidate.line = line_of(item.ident.span());
    candidate.fields = raw_fields;
    Ok(Some(candidate))
}

/// Find the field holding the marker base type
///
/// Returns its position and the field itself, preferring a field annotated
/// with `#[qweld(base)]` over one matched by `is_marker`.
pub fn base_field<'a>(
    item: &'a ItemStruct,
    is_marker: &dyn Fn(&syn::Path) -> bool,
) -> syn::Result<Option<(usize, &'a Field)>> {
    let mut matched = None;

    for (index, field) in item.fields.iter().enumerate() {
        if parse_annotations(&field.attrs)?.base {
            return Ok(Some((index, field)));
        }
        if matched.is_none() && is_marker_field(field, is_marker) {
            matched = Some((index, field));
        }
    }

    Ok(matched)
}

#[derive(Debug, Default)]
struct Annotation {
    tags: Vec<RoleTag>,
    base: bool,
}

fn parse_annotations(attrs: &[Attribute]) -> syn::Result<Annotation> {
    let mut annotation = Annotation::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("qweld")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                annotation.base = true;
                return Ok(());
            }

            let key = meta
                .path
                .get_ident()
                .map(|i| i.to_string())
                .unwrap_or_default();

            match Role::from_key(&key) {
                Some(role) => {
                    let name: LitStr = meta.value()?.parse()?;
                    annotation.tags.push(RoleTag::new(role, name.value()));
                    Ok(())
                }
                None => Err(meta.error(format!(
                    "unknown qweld key `{}`, expected one of property, signal, slot, constructor, base",
                    meta.path.to_token_stream()
                ))),
            }
        })?;
    }

    Ok(annotation)
}

fn is_marker_field(field: &Field, is_marker: &dyn Fn(&syn::Path) -> bool) -> bool {
    match strip(&field.ty) {
        Type::Path(ty) if ty.qself.is_none() => is_marker(&ty.path),
        _ => false,
    }
}

fn line_of(span: proc_macro2::Span) -> Option<usize> {
    let line = span.start().line;
    (line > 0).then_some(line)
}

/// Classify the type of a tagged field
pub fn field_shape(ty: &Type) -> FieldShape {
    match unwrap_phantom(ty) {
        Type::BareFn(func) => {
            let params = func
                .inputs
                .iter()
                .map(|arg| RawParam {
                    name: arg
                        .name
                        .as_ref()
                        .map(|(ident, _)| ident.to_string())
                        .filter(|name| name != "_"),
                    ty: type_name(&arg.ty),
                })
                .collect();

            let returns = match &func.output {
                ReturnType::Default => Vec::new(),
                ReturnType::Type(_, ty) => match strip(ty) {
                    Type::Tuple(tuple) => tuple.elems.iter().map(type_name).collect(),
                    other => vec![type_name(other)],
                },
            };

            FieldShape::Function { params, returns }
        }
        ty @ Type::Path(path) if path.qself.is_none() => FieldShape::Value { ty: type_name(ty) },
        other => FieldShape::Other {
            ty: compact_tokens(other),
        },
    }
}

fn strip(ty: &Type) -> &Type {
    match ty {
        Type::Paren(inner) => strip(&inner.elem),
        Type::Group(inner) => strip(&inner.elem),
        other => other,
    }
}

/// `PhantomData<fn(..)>` -> `fn(..)`
fn unwrap_phantom(ty: &Type) -> &Type {
    let ty = strip(ty);
    let Type::Path(path) = ty else {
        return ty;
    };
    let Some(last) = path.path.segments.last() else {
        return ty;
    };
    if last.ident != "PhantomData" {
        return ty;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return ty;
    };

    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => strip(inner),
        _ => ty,
    }
}

/// Type name as the type table sees it
///
/// Plain paths into `std`/`core`/`alloc` are shortened to their last segment
/// so `std::string::String` reads as `String`.
fn type_name(ty: &Type) -> String {
    if let Type::Path(path) = strip(ty) {
        let segments = &path.path.segments;
        if let (None, Some(first), Some(last)) = (&path.qself, segments.first(), segments.last()) {
            let is_std = ["std", "core", "alloc"].iter().any(|s| first.ident == s);
            if last.arguments.is_none() && (segments.len() == 1 || is_std) {
                return last.ident.to_string();
            }
        }
    }
    compact_tokens(ty)
}

/// Token text without the spaces `to_string` inserts between punctuation
fn compact_tokens(tokens: &impl ToTokens) -> String {
    let text = tokens.to_token_stream().to_string();
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        if c == ' ' {
            let next = chars.peek().copied();
            let word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
            if word(prev) && word(next) {
                out.push(' ');
            }
            continue;
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

/// Module path of a file relative to the source root
///
/// `lib.rs`/`main.rs` map to `crate`, `foo/mod.rs` and `foo.rs` to
/// `crate::foo`.
pub fn module_path_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().replace('-', "_")),
            _ => None,
        })
        .collect();

    if segments.last().is_some_and(|s| s == "mod") {
        segments.pop();
    }
    if segments.len() == 1 && (segments[0] == "lib" || segments[0] == "main") {
        segments.clear();
    }

    std::iter::once("crate".to_string())
        .chain(segments)
        .collect::<Vec<_>>()
        .join("::")
}
